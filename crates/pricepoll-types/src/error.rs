//! Parse errors for provider request parameters.

use thiserror::Error;

/// Error returned when parsing an unknown granularity string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "invalid granularity '{0}', expected one of: 1m, 2m, 5m, 15m, 30m, 60m, 90m, 1h, 1d, 5d, 1wk, 1mo, 3mo"
)]
pub struct GranularityParseError(pub String);

/// Error returned when parsing an invalid lookback period string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodParseError {
    /// The string is empty.
    #[error("period is empty")]
    Empty,

    /// The numeric part is missing, zero, or not a number.
    #[error("invalid period count in '{0}'")]
    InvalidCount(String),

    /// The unit suffix is not one of d, wk, mo, y.
    #[error("invalid period unit in '{0}', expected d, wk, mo, y, ytd or max")]
    InvalidUnit(String),
}
