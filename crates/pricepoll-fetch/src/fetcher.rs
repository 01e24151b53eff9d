//! Batched fetching of normalized rows.

use pricepoll_types::{Granularity, NormalizedRow, Period};
use tracing::{debug, info};

use crate::{DownloadRequest, FetchError, MarketDataProvider, normalize};

/// Fetches and normalizes market data for a set of symbols.
#[derive(Debug, Clone)]
pub struct Fetcher<P> {
    provider: P,
}

impl<P: MarketDataProvider> Fetcher<P> {
    /// Creates a fetcher backed by `provider`.
    #[must_use]
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Returns the underlying provider.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Downloads `symbols` in one batch and normalizes the result.
    ///
    /// `period` and `granularity` use provider notation (`"1d"`, `"7d"`,
    /// `"max"`; `"1m"`, `"1h"`, `"1d"`). Symbols without data are omitted;
    /// an empty symbol list yields an empty result without a network call.
    ///
    /// # Errors
    ///
    /// Returns an error if `period` or `granularity` cannot be parsed, or if
    /// the provider fails the batch as a whole.
    pub async fn fetch(
        &self,
        symbols: &[String],
        period: &str,
        granularity: &str,
    ) -> Result<Vec<NormalizedRow>, FetchError> {
        if symbols.is_empty() {
            debug!("no symbols requested");
            return Ok(Vec::new());
        }

        let period: Period = period.parse()?;
        let granularity: Granularity = granularity.parse()?;
        let request = DownloadRequest::new(symbols.to_vec(), period, granularity);

        debug!(
            provider = self.provider.name(),
            symbols = symbols.len(),
            %period,
            %granularity,
            "downloading"
        );
        let response = self.provider.download(&request).await?;
        let rows = normalize(response, symbols, &self.provider).await;

        info!(
            symbols = symbols.len(),
            rows = rows.len(),
            %period,
            %granularity,
            "fetched rows"
        );
        Ok(rows)
    }
}

/// Returns the longest lookback the provider serves at `granularity`.
///
/// Granularities that cannot be parsed fall back to [`Period::Max`].
#[must_use]
pub fn default_backfill_period(granularity: &str) -> Period {
    granularity
        .parse::<Granularity>()
        .map_or(Period::Max, |g| g.default_backfill_period())
}

/// Resolves the backfill period: a non-blank `configured` value wins,
/// otherwise the default for `granularity`.
#[must_use]
pub fn resolve_backfill_period(configured: &str, granularity: &str) -> String {
    let configured = configured.trim();
    if configured.is_empty() {
        default_backfill_period(granularity).to_string()
    } else {
        configured.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CurrencyLookup, Frame, IndexLabel, ProviderResponse, RawTimestamp, columns};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeProvider {
        requests: Mutex<Vec<DownloadRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl CurrencyLookup for FakeProvider {
        async fn currency(&self, _symbol: &str) -> Option<String> {
            Some("USD".to_string())
        }
    }

    #[async_trait]
    impl MarketDataProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        async fn download(
            &self,
            request: &DownloadRequest,
        ) -> Result<ProviderResponse, FetchError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(FetchError::ServerError {
                    symbol: request.symbols.join(","),
                    status: 503,
                });
            }
            let ts = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
            let mut frame = Frame::new(IndexLabel::Datetime);
            frame.push(
                RawTimestamp::Zoned(ts.fixed_offset()),
                &[(columns::CLOSE, Some(101.5)), (columns::VOLUME, Some(1000.0))],
            );
            Ok(ProviderResponse::SingleSymbol(frame))
        }
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn test_fetch_single_batch() {
        let fetcher = Fetcher::new(FakeProvider::default());
        let rows = fetcher.fetch(&symbols(&["ABC"]), "1d", "1m").await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ticker, "ABC");
        assert_eq!(rows[0].close, Some(101.5));
        assert_eq!(rows[0].volume, Some(1000));
        assert_eq!(rows[0].currency, "USD");

        let requests = fetcher.provider().requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].period, Period::Days(1));
        assert_eq!(requests[0].granularity, Granularity::Minute1);
        assert!(!requests[0].auto_adjust);
    }

    #[tokio::test]
    async fn test_fetch_empty_symbols_skips_provider() {
        let fetcher = Fetcher::new(FakeProvider::default());
        let rows = fetcher.fetch(&[], "1d", "1m").await.unwrap();
        assert!(rows.is_empty());
        assert!(fetcher.provider().requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_parameters() {
        let fetcher = Fetcher::new(FakeProvider::default());
        let tickers = symbols(&["ABC"]);

        let err = fetcher.fetch(&tickers, "1d", "7m").await.unwrap_err();
        assert!(matches!(err, FetchError::Granularity(_)));

        let err = fetcher.fetch(&tickers, "soon", "1m").await.unwrap_err();
        assert!(matches!(err, FetchError::Period(_)));

        assert!(fetcher.provider().requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_propagates_provider_failure() {
        let fetcher = Fetcher::new(FakeProvider {
            fail: true,
            ..FakeProvider::default()
        });
        let err = fetcher
            .fetch(&symbols(&["ABC"]), "1d", "1m")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::ServerError { status: 503, .. }));
    }

    #[test]
    fn test_default_backfill_period() {
        assert_eq!(default_backfill_period("1m"), Period::Days(7));
        assert_eq!(default_backfill_period("15m"), Period::Days(60));
        assert_eq!(default_backfill_period("1h"), Period::Years(2));
        assert_eq!(default_backfill_period("90m"), Period::Years(2));
        assert_eq!(default_backfill_period("1d"), Period::Max);
        assert_eq!(default_backfill_period("bogus"), Period::Max);
    }

    #[test]
    fn test_resolve_backfill_period() {
        assert_eq!(resolve_backfill_period("", "1m"), "7d");
        assert_eq!(resolve_backfill_period("  ", "5m"), "60d");
        assert_eq!(resolve_backfill_period("30d", "1m"), "30d");
        assert_eq!(resolve_backfill_period("", "1wk"), "max");
    }
}
