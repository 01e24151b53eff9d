//! Time-series points derived from normalized rows.

use pricepoll_types::NormalizedRow;
use std::collections::BTreeMap;
use tracing::debug;

/// Measurement every price point is written to.
pub const MEASUREMENT: &str = "lse_prices";

/// Tag and field names.
pub mod keys {
    /// Ticker symbol tag.
    pub const TICKER: &str = "ticker";
    /// Exchange tag.
    pub const EXCHANGE: &str = "exchange";
    /// Trading currency tag.
    pub const CURRENCY: &str = "currency";
    /// Opening price field.
    pub const OPEN: &str = "open";
    /// Highest price field.
    pub const HIGH: &str = "high";
    /// Lowest price field.
    pub const LOW: &str = "low";
    /// Closing price field.
    pub const CLOSE: &str = "close";
    /// Adjusted closing price field.
    pub const ADJ_CLOSE: &str = "adj_close";
    /// Volume field.
    pub const VOLUME: &str = "volume";
}

/// Returns the exchange tag for a ticker: `LSE` for London listings
/// (`.L` suffix), `US` for everything else.
#[must_use]
pub fn exchange_for(ticker: &str) -> &'static str {
    if ticker.ends_with(".L") { "LSE" } else { "US" }
}

/// A typed field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    /// 64-bit float field.
    Float(f64),
    /// 64-bit signed integer field.
    Integer(i64),
}

impl FieldValue {
    /// Returns the value as a float, if it is one.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(_) => None,
        }
    }
}

/// One point: measurement, tags, fields and a nanosecond timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    timestamp_ns: i64,
}

impl DataPoint {
    /// Creates a point with no tags or fields.
    #[must_use]
    pub fn new(measurement: impl Into<String>, timestamp_ns: i64) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp_ns,
        }
    }

    /// Adds a tag.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Builds the point for a normalized row.
    ///
    /// Only present, finite values become fields; the currency tag is left
    /// out when the currency is unknown. Returns `None` if the row has no
    /// value to write or its timestamp is outside the nanosecond range.
    #[must_use]
    pub fn from_row(row: &NormalizedRow) -> Option<Self> {
        let Some(timestamp_ns) = row.datetime.timestamp_nanos_opt() else {
            debug!(ticker = %row.ticker, datetime = %row.datetime, "timestamp out of range, skipping row");
            return None;
        };

        let mut point = Self::new(MEASUREMENT, timestamp_ns)
            .tag(keys::TICKER, row.ticker.as_str())
            .tag(keys::EXCHANGE, exchange_for(&row.ticker));
        if !row.currency.is_empty() {
            point = point.tag(keys::CURRENCY, row.currency.as_str());
        }

        let prices = [
            (keys::OPEN, row.open),
            (keys::HIGH, row.high),
            (keys::LOW, row.low),
            (keys::CLOSE, row.close),
            (keys::ADJ_CLOSE, row.adj_close),
        ];
        for (key, value) in prices {
            if let Some(v) = value.filter(|v| v.is_finite()) {
                point = point.field(key, FieldValue::Float(v));
            }
        }
        if let Some(volume) = row.volume {
            point = point.field(keys::VOLUME, FieldValue::Integer(volume));
        }

        if point.fields.is_empty() {
            debug!(ticker = %row.ticker, datetime = %row.datetime, "row has no values, skipping");
            return None;
        }
        Some(point)
    }

    /// Returns the measurement name.
    #[must_use]
    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    /// Returns the tags, ordered by key.
    #[must_use]
    pub const fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Returns the fields, ordered by key.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Returns the tag value for `key`.
    #[must_use]
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Returns the field value for `key`.
    #[must_use]
    pub fn field_value(&self, key: &str) -> Option<FieldValue> {
        self.fields.get(key).copied()
    }

    /// Returns the timestamp in nanoseconds since the Unix epoch.
    #[must_use]
    pub const fn timestamp_ns(&self) -> i64 {
        self.timestamp_ns
    }
}
