//! Polling loop for the pricepoll poller.
//!
//! This crate owns the process timing:
//!
//! - [`Poller`] - Startup backfill, then fetch, filter, write and sleep forever
//! - [`LoopState`] - The previous configuration snapshot, for change detection
//! - [`filter_recent`] - Keeps the rows inside the recency window

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pricepoll/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod poller;
mod recency;
mod state;

pub use poller::{CycleError, Poller, backfill_period};
pub use recency::{RECENCY_LOOKBACK, filter_recent};
pub use state::{ConfigChange, LoopState};
