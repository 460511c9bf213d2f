//! Rank tiers, with the built-in table used when the server's list is
//! unavailable.

#[cfg(test)]
#[path = "rankings_test.rs"]
mod rankings_test;

use crate::net::api;
use crate::net::fetch::ApiClient;
use crate::net::types::{Ranking, RankingsResponse};

const DEFAULT_TIERS: &[(u32, &str, f64, u32, f64, f64)] = &[
    (1, "welcome", 0.0, 0, 0.0, 0.0),
    (2, "silver", 5_000.0, 0, 0.0, 200.0),
    (3, "silverPro", 25_000.0, 0, 0.0, 1_000.0),
    (4, "gold", 50_000.0, 0, 0.0, 2_000.0),
    (5, "goldPro", 100_000.0, 0, 0.0, 3_000.0),
    (6, "diamond", 500_000.0, 12, 2_550_000.0, 20_000.0),
    (7, "ambassador", 1_000_000.0, 12, 2_550_000.0, 50_000.0),
];

#[must_use]
pub fn default_rankings() -> Vec<Ranking> {
    DEFAULT_TIERS
        .iter()
        .map(|&(level, name, minimum_deposit, direct_referral, referral_deposits, bonus)| Ranking {
            level,
            name: name.to_owned(),
            minimum_deposit,
            direct_referral,
            referral_deposits,
            bonus,
            is_active: None,
        })
        .collect()
}

/// The user's rank table, or the default table (not custom) when the
/// request fails.
pub async fn load_or_default(client: &ApiClient, email: &str) -> RankingsResponse {
    match api::rankings(client, email).await {
        Ok(resp) if !resp.rankings.is_empty() => resp,
        Ok(_) => RankingsResponse { rankings: default_rankings(), is_custom: false },
        Err(e) => {
            tracing::warn!(error = %e, "rankings unavailable; using defaults");
            RankingsResponse { rankings: default_rankings(), is_custom: false }
        }
    }
}

/// Highest tier whose deposit minimum `deposit` reaches. Referral
/// requirements are ignored; the server decides the real rank.
#[must_use]
pub fn rank_for_deposit(rankings: &[Ranking], deposit: f64) -> Option<&Ranking> {
    rankings
        .iter()
        .filter(|r| deposit >= r.minimum_deposit)
        .max_by_key(|r| r.level)
}
