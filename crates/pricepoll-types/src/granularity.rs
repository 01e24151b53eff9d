//! Provider sampling interval definitions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{GranularityParseError, Period};

/// Sampling interval of the observations returned by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    /// 1-minute bars.
    #[serde(rename = "1m")]
    Minute1,
    /// 2-minute bars.
    #[serde(rename = "2m")]
    Minute2,
    /// 5-minute bars.
    #[serde(rename = "5m")]
    Minute5,
    /// 15-minute bars.
    #[serde(rename = "15m")]
    Minute15,
    /// 30-minute bars.
    #[serde(rename = "30m")]
    Minute30,
    /// 60-minute bars.
    #[serde(rename = "60m")]
    Minute60,
    /// 90-minute bars.
    #[serde(rename = "90m")]
    Minute90,
    /// Hourly bars.
    #[serde(rename = "1h")]
    Hour1,
    /// Daily bars.
    #[serde(rename = "1d")]
    Day1,
    /// 5-day bars.
    #[serde(rename = "5d")]
    Day5,
    /// Weekly bars.
    #[serde(rename = "1wk")]
    Week1,
    /// Monthly bars.
    #[serde(rename = "1mo")]
    Month1,
    /// Quarterly bars.
    #[serde(rename = "3mo")]
    Month3,
}

impl Granularity {
    /// Returns the provider's string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minute1 => "1m",
            Self::Minute2 => "2m",
            Self::Minute5 => "5m",
            Self::Minute15 => "15m",
            Self::Minute30 => "30m",
            Self::Minute60 => "60m",
            Self::Minute90 => "90m",
            Self::Hour1 => "1h",
            Self::Day1 => "1d",
            Self::Day5 => "5d",
            Self::Week1 => "1wk",
            Self::Month1 => "1mo",
            Self::Month3 => "3mo",
        }
    }

    /// Returns true if observations carry a time of day (sub-daily bars).
    #[must_use]
    pub const fn is_intraday(&self) -> bool {
        matches!(
            self,
            Self::Minute1
                | Self::Minute2
                | Self::Minute5
                | Self::Minute15
                | Self::Minute30
                | Self::Minute60
                | Self::Minute90
                | Self::Hour1
        )
    }

    /// Returns the longest history the provider serves at this granularity.
    ///
    /// Used as the backfill window when no explicit override is configured.
    #[must_use]
    pub const fn default_backfill_period(&self) -> Period {
        match self {
            Self::Minute1 => Period::Days(7),
            Self::Minute2 | Self::Minute5 | Self::Minute15 | Self::Minute30 => Period::Days(60),
            Self::Minute60 | Self::Minute90 | Self::Hour1 => Period::Years(2),
            Self::Day1 | Self::Day5 | Self::Week1 | Self::Month1 | Self::Month3 => Period::Max,
        }
    }

    /// Returns all supported granularities.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Minute1,
            Self::Minute2,
            Self::Minute5,
            Self::Minute15,
            Self::Minute30,
            Self::Minute60,
            Self::Minute90,
            Self::Hour1,
            Self::Day1,
            Self::Day5,
            Self::Week1,
            Self::Month1,
            Self::Month3,
        ]
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = GranularityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|g| g.as_str() == lowered)
            .ok_or_else(|| GranularityParseError(s.to_string()))
    }
}
