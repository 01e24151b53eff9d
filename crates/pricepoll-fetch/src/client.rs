//! HTTP client configuration and fetch errors.

use pricepoll_types::{GranularityParseError, PeriodParseError};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::url::BASE_URL;

/// Configuration for the provider HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum concurrent per-symbol requests within one batch download.
    pub concurrency: usize,
    /// Request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Provider base URL.
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            // Yahoo rejects requests without a browser-like user agent
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            base_url: BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Sets the maximum number of concurrent per-symbol requests.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the provider base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Builds a pooled HTTP client from this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub(crate) fn build_client(&self) -> Result<Client, reqwest::Error> {
        Client::builder()
            .pool_max_idle_per_host(self.concurrency)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(&self.user_agent)
            .gzip(true)
            .build()
    }
}

/// Errors that can occur while fetching market data.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error status.
    #[error("Server error for {symbol}: {status}")]
    ServerError {
        /// Symbol being requested.
        symbol: String,
        /// HTTP status code.
        status: u16,
    },

    /// Provider returned a payload that could not be understood.
    #[error("Invalid response for {symbol}: {reason}")]
    InvalidResponse {
        /// Symbol being requested.
        symbol: String,
        /// What was wrong with the payload.
        reason: String,
    },

    /// Provider base URL is unusable.
    #[error("Invalid provider URL '{0}'")]
    InvalidUrl(String),

    /// Requested granularity is not supported.
    #[error(transparent)]
    Granularity(#[from] GranularityParseError),

    /// Requested lookback period is malformed.
    #[error(transparent)]
    Period(#[from] PeriodParseError),
}
