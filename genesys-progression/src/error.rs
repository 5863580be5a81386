//! Invalid-input errors raised by the progression engine.
//!
//! Policy outcomes such as a reached daily cap are not errors; they travel as
//! [`crate::Rejection`] values inside a successful result.
use chrono::NaiveDate;
use thiserror::Error;

const DAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProgressionError {
    #[error("xp grants must be non-negative (got {amount})")]
    NegativeXp { amount: i64 },
    #[error("unknown action `{name}`")]
    UnknownAction { name: String },
    #[error("unknown attribute `{name}`")]
    UnknownAttribute { name: String },
    #[error("malformed date `{value}` (expected YYYY-MM-DD)")]
    MalformedDate { value: String },
    #[error("level must be at least 1 (got {level})")]
    InvalidLevel { level: u32 },
    #[error("redeeming `{reward}` must cost at least one point")]
    FreeRedemption { reward: String },
    #[error("xp total overflows ({xp} + {gained})")]
    XpOverflow { xp: u64, gained: u64 },
    #[error("{xp} xp from level {level} goes past the highest level")]
    LevelOverflow { level: u32, xp: u64 },
}

/// Parse a calendar day in `YYYY-MM-DD` form.
///
/// # Errors
///
/// Returns [`ProgressionError::MalformedDate`] when the value is not a valid day.
pub fn parse_day(value: &str) -> Result<NaiveDate, ProgressionError> {
    NaiveDate::parse_from_str(value.trim(), DAY_FORMAT).map_err(|_| {
        ProgressionError::MalformedDate {
            value: value.to_string(),
        }
    })
}
