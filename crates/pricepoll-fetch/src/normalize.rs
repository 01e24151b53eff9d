//! Provider payload normalization.

use pricepoll_types::NormalizedRow;
use tracing::{debug, warn};

use crate::frame::columns::{ADJ_CLOSE, CLOSE, HIGH, LOW, OPEN, VOLUME};
use crate::{CurrencyLookup, Frame, ProviderResponse};

/// Normalizes a provider payload into rows sorted by `(ticker, datetime)`.
///
/// Symbols the response has no data for are skipped with a warning. The
/// currency comes from the frame when the provider reported one; otherwise
/// each symbol with data gets one lookup, and an unknown currency leaves the
/// column empty.
pub async fn normalize<C>(
    response: ProviderResponse,
    symbols: &[String],
    currencies: &C,
) -> Vec<NormalizedRow>
where
    C: CurrencyLookup + ?Sized,
{
    let mut rows = Vec::new();

    match &response {
        ProviderResponse::MultiSymbol(frames) => {
            for symbol in symbols {
                match frames.get(symbol) {
                    Some(frame) => append_symbol(&mut rows, symbol, frame, currencies).await,
                    None => warn!(ticker = %symbol, "no data returned for symbol"),
                }
            }
        }
        ProviderResponse::SingleSymbol(frame) => {
            for symbol in symbols {
                append_symbol(&mut rows, symbol, frame, currencies).await;
            }
        }
    }

    rows.sort_by(|a, b| {
        a.ticker
            .cmp(&b.ticker)
            .then_with(|| a.datetime.cmp(&b.datetime))
    });
    rows
}

async fn append_symbol<C>(rows: &mut Vec<NormalizedRow>, symbol: &str, frame: &Frame, currencies: &C)
where
    C: CurrencyLookup + ?Sized,
{
    if frame.is_empty() {
        warn!(ticker = %symbol, "empty frame returned for symbol");
        return;
    }

    let currency = match frame.currency() {
        Some(currency) => currency.to_string(),
        None => currencies.currency(symbol).await.unwrap_or_default(),
    };
    debug!(ticker = %symbol, rows = frame.len(), index = ?frame.label(), currency = %currency, "normalizing frame");

    rows.extend(frame.index().iter().enumerate().map(|(i, ts)| NormalizedRow {
        ticker: symbol.to_string(),
        datetime: ts.to_utc(),
        open: frame.value(OPEN, i),
        high: frame.value(HIGH, i),
        low: frame.value(LOW, i),
        close: frame.value(CLOSE, i),
        adj_close: frame.value(ADJ_CLOSE, i),
        volume: frame.value(VOLUME, i).map(to_volume),
        currency: currency.clone(),
    }));
}

#[allow(clippy::cast_possible_truncation)]
fn to_volume(value: f64) -> i64 {
    value.round() as i64
}
