//! Recency filtering of incremental fetches.

use chrono::{DateTime, TimeDelta, Utc};
use pricepoll_types::NormalizedRow;

/// How far back an incremental fetch keeps rows.
pub const RECENCY_LOOKBACK: TimeDelta = TimeDelta::minutes(30);

/// Keeps the rows observed at or after `now - lookback`.
#[must_use]
pub fn filter_recent(
    rows: Vec<NormalizedRow>,
    now: DateTime<Utc>,
    lookback: TimeDelta,
) -> Vec<NormalizedRow> {
    let cutoff = now - lookback;
    rows.into_iter().filter(|row| row.datetime >= cutoff).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_filter_recent() {
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
        let rows = vec![
            NormalizedRow::new("A", now - TimeDelta::minutes(40)).with_close(1.0),
            NormalizedRow::new("A", now - TimeDelta::minutes(10)).with_close(2.0),
        ];

        let kept = filter_recent(rows, now, RECENCY_LOOKBACK);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].datetime, now - TimeDelta::minutes(10));
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
        let rows = vec![NormalizedRow::new("A", now - RECENCY_LOOKBACK)];
        assert_eq!(filter_recent(rows, now, RECENCY_LOOKBACK).len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_recent(Vec::new(), Utc::now(), RECENCY_LOOKBACK).is_empty());
    }
}
