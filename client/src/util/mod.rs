//! Utility helpers shared across client modules.

pub mod validate;
