//! Superficial form checks run before a request is sent.
//!
//! The server re-validates everything; these only catch empty or malformed
//! input early and decide how an identifier is submitted.

#[cfg(test)]
#[path = "validate_test.rs"]
mod validate_test;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

pub const OTP_LENGTH: usize = 6;
pub const OTP_RESEND_DELAY_SECS: u64 = 60;
pub const MIN_SIGNUP_PASSWORD_LEN: usize = 8;
pub const MIN_RESET_PASSWORD_LEN: usize = 6;

/// Field name to message, empty when the form is valid.
pub type FormErrors = BTreeMap<&'static str, &'static str>;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// `local@domain.tld` with no whitespace and a single `@`.
#[must_use]
pub fn is_email(input: &str) -> bool {
    EMAIL_RE.is_match(input)
}

/// How a login or reset identifier is submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identifier {
    Email(String),
    Username(String),
}

impl Identifier {
    /// Login rule: a well-formed email, otherwise a username. The input is
    /// submitted as typed; surrounding whitespace makes it a username.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        if is_email(input) {
            Self::Email(input.to_owned())
        } else {
            Self::Username(input.to_owned())
        }
    }

    /// Password-reset rule: anything containing `@` is an email.
    #[must_use]
    pub fn parse_loose(input: &str) -> Self {
        if input.contains('@') {
            Self::Email(input.to_owned())
        } else {
            Self::Username(input.to_owned())
        }
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Email(e) => Some(e),
            Self::Username(_) => None,
        }
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Username(u) => Some(u),
            Self::Email(_) => None,
        }
    }
}

#[must_use]
pub fn validate_login(identifier: &str, password: &str) -> FormErrors {
    let mut errors = FormErrors::new();
    if identifier.trim().is_empty() {
        errors.insert("emailOrUsername", "Email or username is required");
    }
    if password.is_empty() {
        errors.insert("password", "Password is required");
    }
    errors
}

#[must_use]
pub fn validate_signup(username: &str, email: &str, password: &str, terms_accepted: bool) -> FormErrors {
    let mut errors = FormErrors::new();
    if username.trim().is_empty() {
        errors.insert("username", "Username is required");
    }
    if email.trim().is_empty() {
        errors.insert("email", "Email is required");
    } else if !is_email(email) {
        errors.insert("email", "Invalid email format");
    }
    if password.is_empty() {
        errors.insert("password", "Password is required");
    } else if password.chars().count() < MIN_SIGNUP_PASSWORD_LEN {
        errors.insert("password", "Password must be at least 8 characters");
    }
    if !terms_accepted {
        errors.insert("termsAccepted", "You must accept the Terms & Conditions");
    }
    errors
}

#[must_use]
pub fn validate_reset(identifier: &str, new_password: &str, confirm_password: &str) -> FormErrors {
    let mut errors = FormErrors::new();
    if identifier.trim().is_empty() {
        errors.insert("emailOrUsername", "Email or username is required");
    }
    if new_password.is_empty() {
        errors.insert("newPassword", "New password is required");
    } else if new_password.chars().count() < MIN_RESET_PASSWORD_LEN {
        errors.insert("newPassword", "Password must be at least 6 characters");
    }
    if new_password != confirm_password {
        errors.insert("confirmPassword", "Passwords do not match");
    }
    errors
}

/// All `OTP_LENGTH` digits entered.
#[must_use]
pub fn otp_complete(code: &str) -> bool {
    code.len() == OTP_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

/// Round a fiat-to-coin conversion for display and submission: six decimals
/// for fractional amounts below one, two otherwise.
#[must_use]
pub fn round_amount(value: f64) -> f64 {
    let places = if value < 1.0 && value.abs().fract() > 1e-6 { 6 } else { 2 };
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Coin amount for a fiat `amount` at `price`; `None` for a non-positive price.
#[must_use]
pub fn convert_amount(amount: f64, price: f64) -> Option<f64> {
    (price > 0.0).then(|| round_amount(amount / price))
}
