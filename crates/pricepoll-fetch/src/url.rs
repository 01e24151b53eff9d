//! Yahoo Finance chart URL construction.

use reqwest::Url;

/// Base URL of the Yahoo Finance query API.
pub const BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Builds the chart API URL for one symbol.
///
/// URL format: `{base}/v8/finance/chart/{SYMBOL}?range={range}&interval={interval}&includeAdjustedClose=true&events=div,splits`
///
/// The symbol is percent-encoded as a single path segment.
///
/// # Example
///
/// ```
/// use pricepoll_fetch::url::chart_url;
/// use reqwest::Url;
///
/// let base = Url::parse("https://query2.finance.yahoo.com").unwrap();
/// let url = chart_url(&base, "VOD.L", "7d", "1m");
/// assert_eq!(url.path(), "/v8/finance/chart/VOD.L");
/// assert_eq!(url.query_pairs().count(), 4);
/// ```
#[must_use]
pub fn chart_url(base: &Url, symbol: &str, range: &str, interval: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
    }
    url.query_pairs_mut()
        .clear()
        .append_pair("range", range)
        .append_pair("interval", interval)
        .append_pair("includeAdjustedClose", "true")
        .append_pair("events", "div,splits");
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse(BASE_URL).unwrap()
    }

    #[test]
    fn test_chart_url() {
        let url = chart_url(&base(), "VOD.L", "1d", "1m");
        assert_eq!(
            url.as_str(),
            "https://query2.finance.yahoo.com/v8/finance/chart/VOD.L?range=1d&interval=1m&includeAdjustedClose=true&events=div%2Csplits"
        );
    }

    #[test]
    fn test_chart_url_encodes_symbol() {
        let url = chart_url(&base(), "BRK/B", "max", "1d");
        assert_eq!(url.path(), "/v8/finance/chart/BRK%2FB");
    }

    #[test]
    fn test_chart_url_keeps_base_path() {
        let base = Url::parse("http://localhost:8080/proxy/").unwrap();
        let url = chart_url(&base, "AAPL", "5d", "5m");
        assert_eq!(url.path(), "/proxy/v8/finance/chart/AAPL");
        assert!(url.query().unwrap().contains("range=5d"));
    }
}
