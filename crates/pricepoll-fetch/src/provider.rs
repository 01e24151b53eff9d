//! Market data provider abstraction.
//!
//! The provider is the only part of the pipeline that talks to the outside
//! world on the fetch side, so the scheduler and tests swap it freely.

use async_trait::async_trait;
use pricepoll_types::{Granularity, Period};

use crate::{FetchError, ProviderResponse};

/// A batched download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Symbols to download, in request order.
    pub symbols: Vec<String>,
    /// Lookback window.
    pub period: Period,
    /// Sampling interval.
    pub granularity: Granularity,
    /// Whether prices should be adjusted for splits and dividends.
    pub auto_adjust: bool,
}

impl DownloadRequest {
    /// Creates an unadjusted-price request.
    #[must_use]
    pub const fn new(symbols: Vec<String>, period: Period, granularity: Granularity) -> Self {
        Self {
            symbols,
            period,
            granularity,
            auto_adjust: false,
        }
    }
}

/// Best-effort lookup of a symbol's trading currency.
///
/// `None` is an expected outcome, not a failure.
#[async_trait]
pub trait CurrencyLookup: Send + Sync {
    /// Returns the trading currency of `symbol`, if it can be determined.
    async fn currency(&self, symbol: &str) -> Option<String>;
}

/// A source of OHLCV observations.
#[async_trait]
pub trait MarketDataProvider: CurrencyLookup {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Downloads every requested symbol in one batched call.
    ///
    /// Symbols without data are simply absent from the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch as a whole fails.
    async fn download(&self, request: &DownloadRequest) -> Result<ProviderResponse, FetchError>;
}
