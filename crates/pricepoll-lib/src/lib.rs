//! Poll market prices from Yahoo Finance into InfluxDB.
//!
//! This is a facade crate that re-exports functionality from the pricepoll
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use pricepoll_lib::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = ConnectionSettings::from_env();
//!     let client = InfluxClient::connect(&connection, WriteOptions::default()).await?;
//!     let fetcher = Fetcher::new(YahooProvider::with_defaults()?);
//!
//!     Poller::new(ConfigSource::default(), fetcher, Sink::new(client), &connection)
//!         .run()
//!         .await;
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pricepoll/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use pricepoll_types::*;

// Re-export configuration
pub use pricepoll_config::{
    Config, ConfigSource, ConnectionSettings, DEFAULT_ENV_PATH, Environment, read_env_file,
};

// Re-export fetch functionality
#[cfg(feature = "fetch")]
pub use pricepoll_fetch::{
    ClientConfig, CurrencyLookup, DownloadRequest, FetchError, Fetcher, Frame, IndexLabel,
    MarketDataProvider, ProviderResponse, RawTimestamp, YahooProvider, default_backfill_period,
    normalize, resolve_backfill_period,
};

// Re-export the sink
#[cfg(feature = "sink")]
pub use pricepoll_sink::{
    DataPoint, FieldValue, InfluxClient, MEASUREMENT, PointWriter, Sink, SinkError,
    WriteOptions, WriteOutcome, error_chain,
};

// Re-export the polling loop
#[cfg(feature = "scheduler")]
pub use pricepoll_scheduler::{
    ConfigChange, CycleError, LoopState, Poller, RECENCY_LOOKBACK, backfill_period,
    filter_recent,
};

/// Prelude module for convenient imports.
///
/// ```
/// use pricepoll_lib::prelude::*;
/// ```
pub mod prelude {
    pub use pricepoll_types::{Granularity, NormalizedRow, Period};

    pub use pricepoll_config::{Config, ConfigSource, ConnectionSettings, Environment};

    #[cfg(feature = "fetch")]
    pub use pricepoll_fetch::{ClientConfig, Fetcher, MarketDataProvider, YahooProvider};

    #[cfg(feature = "sink")]
    pub use pricepoll_sink::{InfluxClient, PointWriter, Sink, WriteOptions, WriteOutcome};

    #[cfg(feature = "scheduler")]
    pub use pricepoll_scheduler::Poller;
}
