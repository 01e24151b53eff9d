//! Row sink.

use pricepoll_types::NormalizedRow;
use std::error::Error;
use tracing::{error, info};

use crate::{DataPoint, PointWriter};

/// What happened to a batch handed to [`Sink::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Nothing to write.
    Empty,
    /// Points were written.
    Written(usize),
    /// The write failed; points past the committed ones were dropped.
    Dropped {
        /// Points committed by earlier batches before the failure.
        committed: usize,
    },
}

/// Writes normalized rows as points, absorbing every write failure.
#[derive(Debug, Clone)]
pub struct Sink<W> {
    writer: W,
}

impl<W: PointWriter> Sink<W> {
    /// Creates a sink on top of `writer`.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    #[must_use]
    pub const fn writer(&self) -> &W {
        &self.writer
    }

    /// Converts `rows` into points and writes them in one batched call.
    ///
    /// Never fails: a write error is logged with its cause chain and the
    /// batch is dropped. Rows are not deduplicated.
    pub async fn write(&self, rows: &[NormalizedRow], bucket: &str, org: &str) -> WriteOutcome {
        let points: Vec<DataPoint> = rows.iter().filter_map(DataPoint::from_row).collect();
        if points.is_empty() {
            info!(rows = rows.len(), "nothing to write");
            return WriteOutcome::Empty;
        }

        match self.writer.write_points(bucket, org, &points).await {
            Ok(()) => {
                info!(points = points.len(), bucket, "wrote points");
                WriteOutcome::Written(points.len())
            }
            Err(e) => {
                let committed = e.committed();
                error!(
                    error = %error_chain(&e),
                    committed,
                    dropped = points.len().saturating_sub(committed),
                    bucket,
                    "write failed, dropping uncommitted points"
                );
                WriteOutcome::Dropped { committed }
            }
        }
    }
}

/// Formats an error followed by its sources, separated by `: `.
#[must_use]
pub fn error_chain(err: &dyn Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        // thiserror's `{0}` formatting already embeds the direct source
        if !out.ends_with(&cause_text) {
            out.push_str(": ");
            out.push_str(&cause_text);
        }
        source = cause.source();
    }
    out
}
