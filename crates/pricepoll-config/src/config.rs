//! Poll settings snapshot.

use pricepoll_types::{Granularity, Period};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Recognized configuration keys.
pub mod keys {
    /// Comma-separated ticker list.
    pub const TICKERS: &str = "TICKERS";
    /// Seconds to sleep between poll iterations.
    pub const FETCH_INTERVAL_SECONDS: &str = "FETCH_INTERVAL_SECONDS";
    /// Provider granularity for steady-state polling.
    pub const YF_INTERVAL: &str = "YF_INTERVAL";
    /// Provider lookback window for steady-state polling.
    pub const YF_PERIOD: &str = "YF_PERIOD";
    /// Whether to run a historical backfill at startup.
    pub const BACKFILL_ON_START: &str = "BACKFILL_ON_START";
    /// Optional backfill window override.
    pub const BACKFILL_PERIOD: &str = "BACKFILL_PERIOD";
}

const DEFAULT_TICKERS: &str = "VOD.L,HSBA.L,BP.L";
const DEFAULT_FETCH_INTERVAL_SECONDS: u64 = 300;
const DEFAULT_FETCH_INTERVAL: &str = "1m";
const DEFAULT_FETCH_PERIOD: &str = "1d";
const DEFAULT_BACKFILL_ON_START: bool = true;

/// Poll settings, rebuilt from scratch on every reload.
///
/// Two snapshots are equal iff every field is equal; that equality is the
/// only signal used to decide whether the configuration changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Ticker symbols to poll, in configured order. Never empty.
    pub tickers: Vec<String>,
    /// Seconds to sleep between poll iterations. Always positive.
    pub fetch_interval_seconds: u64,
    /// Provider granularity string (e.g. `1m`).
    pub fetch_interval: String,
    /// Provider lookback window string (e.g. `1d`).
    pub fetch_period: String,
    /// Run a one-time historical backfill at startup.
    pub backfill_on_start: bool,
    /// Backfill window override; empty derives it from the granularity.
    pub backfill_period: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tickers: split_tickers(DEFAULT_TICKERS),
            fetch_interval_seconds: DEFAULT_FETCH_INTERVAL_SECONDS,
            fetch_interval: DEFAULT_FETCH_INTERVAL.to_string(),
            fetch_period: DEFAULT_FETCH_PERIOD.to_string(),
            backfill_on_start: DEFAULT_BACKFILL_ON_START,
            backfill_period: String::new(),
        }
    }
}

impl Config {
    /// Builds a snapshot from merged key/value pairs.
    ///
    /// Missing keys and values that fail to parse fall back to their defaults.
    #[must_use]
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let value = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let tickers = match value(keys::TICKERS).map(split_tickers) {
            Some(tickers) if !tickers.is_empty() => tickers,
            Some(_) => {
                warn!(key = keys::TICKERS, "ticker list is empty, using default");
                defaults.tickers
            }
            None => defaults.tickers,
        };

        let fetch_interval_seconds = match value(keys::FETCH_INTERVAL_SECONDS) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    warn!(
                        key = keys::FETCH_INTERVAL_SECONDS,
                        value = raw,
                        "invalid poll interval, using default"
                    );
                    defaults.fetch_interval_seconds
                }
            },
            None => defaults.fetch_interval_seconds,
        };

        Self {
            tickers,
            fetch_interval_seconds,
            fetch_interval: validated::<Granularity>(
                keys::YF_INTERVAL,
                value(keys::YF_INTERVAL),
                defaults.fetch_interval,
            ),
            fetch_period: validated::<Period>(
                keys::YF_PERIOD,
                value(keys::YF_PERIOD),
                defaults.fetch_period,
            ),
            backfill_on_start: value(keys::BACKFILL_ON_START)
                .map_or(defaults.backfill_on_start, parse_flag),
            backfill_period: validated::<Period>(
                keys::BACKFILL_PERIOD,
                value(keys::BACKFILL_PERIOD),
                defaults.backfill_period,
            ),
        }
    }

    /// Returns the sleep between poll iterations.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_seconds)
    }
}

/// Splits a comma-separated ticker list, trimming and dropping empty entries.
fn split_tickers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keeps `raw` if it parses as `T`, otherwise warns and returns `default`.
fn validated<T>(key: &str, raw: Option<&str>, default: String) -> String
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        Some(raw) => match raw.parse::<T>() {
            Ok(_) => raw.to_string(),
            Err(e) => {
                warn!(key, value = raw, error = %e, "invalid setting, using default");
                default
            }
        },
        None => default,
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes" | "y")
}
