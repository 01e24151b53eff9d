//! Provider response payloads before normalization.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::collections::BTreeMap;

/// Provider column names.
pub mod columns {
    /// Opening price column.
    pub const OPEN: &str = "Open";
    /// Highest price column.
    pub const HIGH: &str = "High";
    /// Lowest price column.
    pub const LOW: &str = "Low";
    /// Closing price column.
    pub const CLOSE: &str = "Close";
    /// Adjusted closing price column.
    pub const ADJ_CLOSE: &str = "Adj Close";
    /// Volume column.
    pub const VOLUME: &str = "Volume";
}

/// Name of the timestamp index column, which depends on the granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexLabel {
    /// Date-only index (daily and coarser bars).
    Date,
    /// Date-and-time index (intraday bars).
    Datetime,
    /// Index without a name.
    Unnamed,
}

impl IndexLabel {
    /// Resolves a provider index column name.
    #[must_use]
    pub fn from_column_name(name: &str) -> Self {
        match name {
            "Date" => Self::Date,
            "Datetime" => Self::Datetime,
            _ => Self::Unnamed,
        }
    }
}

/// A timestamp as the provider reported it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTimestamp {
    /// Calendar date without time; interpreted as midnight UTC.
    Date(NaiveDate),
    /// Date and time without an offset; interpreted as UTC.
    Naive(NaiveDateTime),
    /// Date and time in the exchange's offset.
    Zoned(DateTime<FixedOffset>),
}

impl RawTimestamp {
    /// Converts to the canonical UTC timestamp.
    #[must_use]
    pub fn to_utc(self) -> DateTime<Utc> {
        match self {
            Self::Date(date) => date.and_time(NaiveTime::MIN).and_utc(),
            Self::Naive(naive) => naive.and_utc(),
            Self::Zoned(zoned) => zoned.with_timezone(&Utc),
        }
    }
}

/// Observations for one symbol: a timestamp index plus named numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    label: IndexLabel,
    index: Vec<RawTimestamp>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
    currency: Option<String>,
}

impl Frame {
    /// Creates an empty frame with the given index label.
    #[must_use]
    pub const fn new(label: IndexLabel) -> Self {
        Self {
            label,
            index: Vec::new(),
            columns: BTreeMap::new(),
            currency: None,
        }
    }

    /// Creates a frame from an index and its columns.
    ///
    /// Columns shorter than the index are treated as missing values past
    /// their end.
    #[must_use]
    pub fn from_parts(
        label: IndexLabel,
        index: Vec<RawTimestamp>,
        columns: impl IntoIterator<Item = (String, Vec<Option<f64>>)>,
    ) -> Self {
        Self {
            label,
            index,
            columns: columns.into_iter().collect(),
            currency: None,
        }
    }

    /// Sets the trading currency the provider reported with the bars.
    ///
    /// Blank values are treated as unknown.
    #[must_use]
    pub fn with_currency(mut self, currency: Option<String>) -> Self {
        self.currency = currency.filter(|c| !c.trim().is_empty());
        self
    }

    /// Returns the trading currency reported with the bars, if any.
    #[must_use]
    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    /// Appends one observation.
    ///
    /// Columns absent from `values` get a missing value for this row.
    pub fn push(&mut self, timestamp: RawTimestamp, values: &[(&str, Option<f64>)]) {
        let row = self.index.len();
        self.index.push(timestamp);
        for (name, value) in values {
            let column = self.columns.entry((*name).to_string()).or_default();
            column.resize(row, None);
            column.push(*value);
        }
    }

    /// Returns the index label.
    #[must_use]
    pub const fn label(&self) -> IndexLabel {
        self.label
    }

    /// Returns the timestamp index.
    #[must_use]
    pub fn index(&self) -> &[RawTimestamp] {
        &self.index
    }

    /// Returns the value at `row` in `column`, if present and finite.
    #[must_use]
    pub fn value(&self, column: &str, row: usize) -> Option<f64> {
        self.columns
            .get(column)
            .and_then(|values| values.get(row).copied().flatten())
            .filter(|v| v.is_finite())
    }

    /// Returns true if the frame holds a column with the given name.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Returns the number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if the frame has no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// A provider payload, resolved once into one of its two shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResponse {
    /// Frames keyed by symbol; symbols without data are absent.
    MultiSymbol(BTreeMap<String, Frame>),
    /// One flat frame for a single-symbol request.
    SingleSymbol(Frame),
}

impl ProviderResponse {
    /// Returns true if no frame holds any observation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::MultiSymbol(frames) => frames.values().all(Frame::is_empty),
            Self::SingleSymbol(frame) => frame.is_empty(),
        }
    }
}
