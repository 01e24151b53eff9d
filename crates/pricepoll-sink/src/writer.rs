//! Point writer abstraction.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::DataPoint;

/// Errors that can occur while writing points.
#[derive(Error, Debug)]
pub enum SinkError {
    /// HTTP request failed or timed out.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("InfluxDB returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, usually a JSON error message.
        body: String,
    },

    /// Server URL is unusable.
    #[error("Invalid InfluxDB URL '{0}'")]
    InvalidUrl(String),

    /// A batch failed after earlier batches of the same write were committed.
    #[error("write failed after {committed} points were committed")]
    Partial {
        /// Points already committed by earlier batches.
        committed: usize,
        /// Failure of the batch that did not make it.
        #[source]
        source: Box<SinkError>,
    },
}

impl SinkError {
    /// Wraps `error` with the number of points committed before it, if any.
    #[must_use]
    pub fn after_commit(committed: usize, error: Self) -> Self {
        if committed == 0 {
            return error;
        }
        Self::Partial {
            committed,
            source: Box::new(error),
        }
    }

    /// Returns how many points were committed before the failure.
    #[must_use]
    pub const fn committed(&self) -> usize {
        match self {
            Self::Partial { committed, .. } => *committed,
            _ => 0,
        }
    }
}

/// Batching behaviour of a [`PointWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Maximum number of points per request.
    pub batch_size: usize,
    /// Time each batch has to reach the server.
    pub flush_interval: Duration,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            batch_size: 500,
            flush_interval: Duration::from_millis(5_000),
        }
    }
}

impl WriteOptions {
    /// Sets the maximum number of points per request.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the per-batch flush deadline.
    #[must_use]
    pub const fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }
}

/// A batched write path into a time-series store.
#[async_trait]
pub trait PointWriter: Send + Sync {
    /// Writes `points` to `bucket` in `org`.
    ///
    /// # Errors
    ///
    /// Returns an error if any batch fails to write.
    async fn write_points(
        &self,
        bucket: &str,
        org: &str,
        points: &[DataPoint],
    ) -> Result<(), SinkError>;
}
