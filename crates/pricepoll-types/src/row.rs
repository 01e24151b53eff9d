//! Normalized price row representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical column order of a normalized row.
pub const ROW_COLUMNS: [&str; 9] = [
    "ticker",
    "datetime",
    "open",
    "high",
    "low",
    "close",
    "adj_close",
    "volume",
    "currency",
];

/// One OHLCV observation for a ticker, in the uniform schema every
/// provider response is normalized into.
///
/// Price and volume columns are optional: a value the provider did not
/// report stays `None` all the way to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    /// Ticker symbol as requested from the provider.
    pub ticker: String,
    /// Observation timestamp (UTC).
    pub datetime: DateTime<Utc>,
    /// Opening price.
    pub open: Option<f64>,
    /// Highest price.
    pub high: Option<f64>,
    /// Lowest price.
    pub low: Option<f64>,
    /// Closing price (unadjusted).
    pub close: Option<f64>,
    /// Close adjusted for splits and dividends.
    pub adj_close: Option<f64>,
    /// Traded volume.
    pub volume: Option<i64>,
    /// Trading currency, empty when unknown.
    pub currency: String,
}

impl NormalizedRow {
    /// Creates a row with no price or volume values and no currency.
    #[must_use]
    pub fn new(ticker: impl Into<String>, datetime: DateTime<Utc>) -> Self {
        Self {
            ticker: ticker.into(),
            datetime,
            open: None,
            high: None,
            low: None,
            close: None,
            adj_close: None,
            volume: None,
            currency: String::new(),
        }
    }

    /// Sets the open, high, low and close prices.
    #[must_use]
    pub const fn with_ohlc(mut self, open: f64, high: f64, low: f64, close: f64) -> Self {
        self.open = Some(open);
        self.high = Some(high);
        self.low = Some(low);
        self.close = Some(close);
        self
    }

    /// Sets the closing price.
    #[must_use]
    pub const fn with_close(mut self, close: f64) -> Self {
        self.close = Some(close);
        self
    }

    /// Sets the traded volume.
    #[must_use]
    pub const fn with_volume(mut self, volume: i64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Sets the trading currency.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}
