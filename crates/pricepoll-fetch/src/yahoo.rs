//! Yahoo Finance data provider.
//!
//! Fetches OHLCV bars from Yahoo's v8 chart API. The chart endpoint serves one
//! symbol per request, so a batch download fans out concurrently and the
//! results are assembled into a single [`ProviderResponse`].

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use futures::stream::{self, StreamExt};
use pricepoll_types::Granularity;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::frame::columns::{ADJ_CLOSE, CLOSE, HIGH, LOW, OPEN, VOLUME};
use crate::url::chart_url;
use crate::{
    ClientConfig, CurrencyLookup, DownloadRequest, FetchError, Frame, IndexLabel,
    MarketDataProvider, ProviderResponse, RawTimestamp,
};

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    currency: Option<String>,
    gmtoffset: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
#[derive(Debug, Clone)]
pub struct YahooProvider {
    client: Client,
    config: ClientConfig,
    base_url: Url,
}

impl YahooProvider {
    /// Creates a provider with the given client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be created.
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|_| FetchError::InvalidUrl(config.base_url.clone()))?;
        let client = config.build_client()?;
        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Creates a provider with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(ClientConfig::default())
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Requests the chart for one symbol.
    ///
    /// Returns `Ok(None)` if the provider does not know the symbol.
    async fn chart(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<Option<ChartData>, FetchError> {
        let url = chart_url(&self.base_url, symbol, range, interval);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::ServerError {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let chart: ChartResponse =
            serde_json::from_slice(&body).map_err(|e| FetchError::InvalidResponse {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            })?;
        parse_chart(symbol, chart)
    }
}

#[async_trait]
impl CurrencyLookup for YahooProvider {
    async fn currency(&self, symbol: &str) -> Option<String> {
        match self.chart(symbol, "1d", "1d").await {
            Ok(data) => data
                .and_then(|d| d.meta.currency)
                .filter(|c| !c.is_empty()),
            Err(e) => {
                debug!(symbol, error = %e, "currency lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    async fn download(&self, request: &DownloadRequest) -> Result<ProviderResponse, FetchError> {
        let range = request.period.to_string();
        let interval = request.granularity.as_str();
        let granularity = request.granularity;

        let results: Vec<(String, Result<Option<Frame>, FetchError>)> =
            stream::iter(request.symbols.clone())
                .map(|symbol| {
                    let range = range.clone();
                    async move {
                        let result = self
                            .chart(&symbol, range.as_str(), interval)
                            .await
                            .map(|data| data.map(|d| chart_frame(d, granularity)));
                        (symbol, result)
                    }
                })
                .buffer_unordered(self.config.concurrency.max(1))
                .collect()
                .await;

        assemble(request, results)
    }
}

/// Extracts the first chart result, mapping "Not Found" to `None`.
fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<Option<ChartData>, FetchError> {
    if let Some(err) = resp.chart.error {
        if err.code == "Not Found" {
            return Ok(None);
        }
        return Err(FetchError::InvalidResponse {
            symbol: symbol.to_string(),
            reason: format!("{}: {}", err.code, err.description),
        });
    }
    Ok(resp.chart.result.and_then(|r| r.into_iter().next()))
}

const fn index_label(granularity: Granularity) -> IndexLabel {
    if granularity.is_intraday() {
        IndexLabel::Datetime
    } else {
        IndexLabel::Date
    }
}

/// Converts a chart result into a frame indexed in the exchange's offset.
fn chart_frame(data: ChartData, granularity: Granularity) -> Frame {
    let offset = data
        .meta
        .gmtoffset
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());

    let timestamps = data.timestamp.unwrap_or_default();
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    let adj_closes = data
        .indicators
        .adjclose
        .and_then(|v| v.into_iter().next())
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let mut frame = Frame::new(index_label(granularity)).with_currency(data.meta.currency);

    for (i, &ts) in timestamps.iter().enumerate() {
        let Some(utc) = DateTime::from_timestamp(ts, 0) else {
            warn!(timestamp = ts, "skipping out-of-range timestamp");
            continue;
        };
        let at = |values: &[Option<f64>]| values.get(i).copied().flatten();

        let open = at(&quote.open);
        let high = at(&quote.high);
        let low = at(&quote.low);
        let close = at(&quote.close);
        let volume = at(&quote.volume);

        // Holidays and halted sessions come back as all-null bars
        if open.is_none() && high.is_none() && low.is_none() && close.is_none() && volume.is_none()
        {
            continue;
        }

        let local = utc.with_timezone(&offset);
        let timestamp = if granularity.is_intraday() {
            RawTimestamp::Zoned(local)
        } else {
            RawTimestamp::Date(local.date_naive())
        };

        frame.push(
            timestamp,
            &[
                (OPEN, open),
                (HIGH, high),
                (LOW, low),
                (CLOSE, close),
                (ADJ_CLOSE, at(&adj_closes)),
                (VOLUME, volume),
            ],
        );
    }

    frame
}

/// Assembles per-symbol results into the response shape for the request.
///
/// A batch only fails when every symbol failed; otherwise failed symbols are
/// logged and left out.
fn assemble(
    request: &DownloadRequest,
    results: Vec<(String, Result<Option<Frame>, FetchError>)>,
) -> Result<ProviderResponse, FetchError> {
    let empty = || Frame::new(index_label(request.granularity));

    if request.symbols.len() == 1 {
        return match results.into_iter().next() {
            Some((_, Ok(frame))) => Ok(ProviderResponse::SingleSymbol(
                frame.unwrap_or_else(empty),
            )),
            Some((_, Err(e))) => Err(e),
            None => Ok(ProviderResponse::SingleSymbol(empty())),
        };
    }

    let total = results.len();
    let mut failed = 0;
    let mut first_error = None;
    let mut frames = BTreeMap::new();

    for (symbol, result) in results {
        match result {
            Ok(Some(frame)) if !frame.is_empty() => {
                frames.insert(symbol, frame);
            }
            Ok(_) => debug!(symbol = %symbol, "provider returned no bars"),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "symbol download failed");
                failed += 1;
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if failed == total => Err(e),
        _ => Ok(ProviderResponse::MultiSymbol(frames)),
    }
}
