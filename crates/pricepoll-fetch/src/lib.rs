//! Market data fetching and normalization for the pricepoll poller.
//!
//! This crate provides the fetch half of the pipeline:
//!
//! - [`MarketDataProvider`] - One batched download call per symbol set
//! - [`YahooProvider`] - Yahoo Finance chart API implementation
//! - [`ProviderResponse`] - Multi-symbol or single-symbol payload
//! - [`normalize`] - Provider payload to sorted [`NormalizedRow`]s
//! - [`Fetcher`] - Download then normalize, plus backfill window policy
//!
//! [`NormalizedRow`]: pricepoll_types::NormalizedRow

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pricepoll/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod fetcher;
mod frame;
mod normalize;
mod provider;
pub mod url;
mod yahoo;

pub use client::{ClientConfig, FetchError};
pub use fetcher::{Fetcher, default_backfill_period, resolve_backfill_period};
pub use frame::{Frame, IndexLabel, ProviderResponse, RawTimestamp, columns};
pub use normalize::normalize;
pub use provider::{CurrencyLookup, DownloadRequest, MarketDataProvider};
pub use yahoo::YahooProvider;
