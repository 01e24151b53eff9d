//! Lookback windows requested from the provider.

use std::str::FromStr;

use crate::PeriodParseError;

/// How far back the provider should return observations.
///
/// Formats as the provider's range string (`7d`, `60d`, `2y`, `ytd`, `max`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    /// The last `n` days.
    Days(u32),
    /// The last `n` weeks.
    Weeks(u32),
    /// The last `n` months.
    Months(u32),
    /// The last `n` years.
    Years(u32),
    /// Since the start of the current calendar year.
    YearToDate,
    /// All available history.
    Max,
}

impl Period {
    /// Returns true if this period requests the full available history.
    #[must_use]
    pub const fn is_max(&self) -> bool {
        matches!(self, Self::Max)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Days(n) => write!(f, "{n}d"),
            Self::Weeks(n) => write!(f, "{n}wk"),
            Self::Months(n) => write!(f, "{n}mo"),
            Self::Years(n) => write!(f, "{n}y"),
            Self::YearToDate => f.write_str("ytd"),
            Self::Max => f.write_str("max"),
        }
    }
}

impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        match lowered.as_str() {
            "" => return Err(PeriodParseError::Empty),
            "ytd" => return Ok(Self::YearToDate),
            "max" => return Ok(Self::Max),
            _ => {}
        }

        let split = lowered
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| PeriodParseError::InvalidUnit(s.to_string()))?;
        let (count, unit) = lowered.split_at(split);

        let count: u32 = count
            .parse()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| PeriodParseError::InvalidCount(s.to_string()))?;

        match unit {
            "d" => Ok(Self::Days(count)),
            "wk" => Ok(Self::Weeks(count)),
            "mo" => Ok(Self::Months(count)),
            "y" => Ok(Self::Years(count)),
            _ => Err(PeriodParseError::InvalidUnit(s.to_string())),
        }
    }
}
