//! Core types for the pricepoll market data poller.
//!
//! This crate provides the value types shared across the pricepoll pipeline:
//!
//! - [`NormalizedRow`] - One normalized OHLCV observation for a ticker
//! - [`Granularity`] - Sampling interval of provider observations
//! - [`Period`] - Lookback window requested from the provider

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pricepoll/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod granularity;
mod period;
mod row;

pub use error::{GranularityParseError, PeriodParseError};
pub use granularity::Granularity;
pub use period::Period;
pub use row::{NormalizedRow, ROW_COLUMNS};
