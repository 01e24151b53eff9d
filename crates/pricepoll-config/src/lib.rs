//! Layered, hot-reloadable configuration for the pricepoll market data poller.
//!
//! - [`Config`] - Poll settings snapshot, compared by value on every reload
//! - [`ConfigSource`] - Merges an env file with the process environment
//! - [`Environment`] - Where environment overrides come from
//! - [`ConnectionSettings`] - InfluxDB connection, fixed at process start

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pricepoll/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod connection;
mod source;

pub use config::{Config, keys};
pub use connection::ConnectionSettings;
pub use source::{ConfigSource, DEFAULT_ENV_PATH, Environment, read_env_file};
