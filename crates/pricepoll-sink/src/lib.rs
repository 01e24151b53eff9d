//! InfluxDB sink for the pricepoll poller.
//!
//! This crate provides the write half of the pipeline:
//!
//! - [`DataPoint`] - Measurement, tags, typed fields and a nanosecond timestamp
//! - [`line_protocol`] - Line protocol encoding
//! - [`InfluxClient`] - InfluxDB v2 HTTP write client
//! - [`Sink`] - Rows to points, with write failures absorbed

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pricepoll/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod influx;
pub mod line_protocol;
mod point;
mod sink;
mod writer;

pub use influx::InfluxClient;
pub use point::{DataPoint, FieldValue, MEASUREMENT, exchange_for, keys};
pub use sink::{Sink, WriteOutcome, error_chain};
pub use writer::{PointWriter, SinkError, WriteOptions};
