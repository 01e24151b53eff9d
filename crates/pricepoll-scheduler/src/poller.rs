//! The polling loop.

use chrono::Utc;
use futures::FutureExt;
use pricepoll_config::{Config, ConfigSource, ConnectionSettings};
use pricepoll_fetch::{FetchError, Fetcher, MarketDataProvider, resolve_backfill_period};
use pricepoll_sink::{PointWriter, Sink, WriteOutcome, error_chain};
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{ConfigChange, LoopState, RECENCY_LOOKBACK, filter_recent};

/// Errors that end a single backfill or poll iteration.
#[derive(Error, Debug)]
pub enum CycleError {
    /// The batch download failed.
    #[error("fetch failed")]
    Fetch(#[from] FetchError),

    /// The iteration panicked.
    #[error("iteration panicked: {0}")]
    Panicked(String),
}

/// Returns the backfill lookback for `config`: the configured override, or
/// the longest window the provider serves at the configured granularity.
#[must_use]
pub fn backfill_period(config: &Config) -> String {
    resolve_backfill_period(&config.backfill_period, &config.fetch_interval)
}

/// Drives fetch, filter and write on the configured cadence.
///
/// The loop owns all timing. Configuration is reloaded at the top of each
/// iteration; the sleep that follows always uses the interval of the
/// configuration that iteration ran with.
#[derive(Debug)]
pub struct Poller<P, W> {
    source: ConfigSource,
    fetcher: Fetcher<P>,
    sink: Sink<W>,
    bucket: String,
    org: String,
    state: LoopState,
}

impl<P, W> Poller<P, W>
where
    P: MarketDataProvider,
    W: PointWriter,
{
    /// Creates a poller writing to the bucket and org of `connection`.
    #[must_use]
    pub fn new(
        source: ConfigSource,
        fetcher: Fetcher<P>,
        sink: Sink<W>,
        connection: &ConnectionSettings,
    ) -> Self {
        Self {
            source,
            fetcher,
            sink,
            bucket: connection.bucket.clone(),
            org: connection.org.clone(),
            state: LoopState::new(),
        }
    }

    /// Returns the loop state.
    #[must_use]
    pub const fn state(&self) -> &LoopState {
        &self.state
    }

    /// Returns the fetcher.
    #[must_use]
    pub const fn fetcher(&self) -> &Fetcher<P> {
        &self.fetcher
    }

    /// Returns the sink.
    #[must_use]
    pub const fn sink(&self) -> &Sink<W> {
        &self.sink
    }

    /// Loads the configuration and records it as the current snapshot.
    pub fn reload(&mut self) -> Config {
        let config = self.source.load();
        match self.state.observe(&config) {
            ConfigChange::Initial => info!(?config, "config loaded"),
            ConfigChange::Changed => info!(?config, "config reloaded"),
            ConfigChange::Unchanged => debug!("config unchanged"),
        }
        config
    }

    /// Fetches the backfill window for every ticker and writes all of it.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch download fails.
    pub async fn backfill(&self, config: &Config) -> Result<WriteOutcome, CycleError> {
        let period = backfill_period(config);
        info!(
            tickers = ?config.tickers,
            %period,
            interval = %config.fetch_interval,
            "backfilling"
        );
        let rows = self
            .fetcher
            .fetch(&config.tickers, &period, &config.fetch_interval)
            .await?;
        Ok(self.sink.write(&rows, &self.bucket, &self.org).await)
    }

    /// Fetches the incremental window and writes the recent rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch download fails.
    pub async fn poll(&self, config: &Config) -> Result<WriteOutcome, CycleError> {
        let rows = self
            .fetcher
            .fetch(&config.tickers, &config.fetch_period, &config.fetch_interval)
            .await?;
        let fetched = rows.len();
        let rows = filter_recent(rows, Utc::now(), RECENCY_LOOKBACK);
        debug!(fetched, recent = rows.len(), "filtered to recent rows");
        Ok(self.sink.write(&rows, &self.bucket, &self.org).await)
    }

    /// Loads the initial configuration and runs the startup backfill if
    /// enabled. A failed backfill is logged and startup continues.
    pub async fn start(&mut self) -> Config {
        let config = self.reload();
        if config.backfill_on_start {
            match guarded(self.backfill(&config)).await {
                Ok(outcome) => info!(?outcome, "backfill complete"),
                Err(e) => {
                    let trace = backtrace();
                    error!(
                        error = %error_chain(&e),
                        backtrace = trace.as_deref(),
                        "backfill failed, continuing"
                    );
                }
            }
        } else {
            info!("startup backfill disabled");
        }
        config
    }

    /// Runs one iteration without sleeping and returns the configuration it
    /// ran with. Failures and panics are logged, never propagated.
    pub async fn iterate(&mut self) -> Config {
        let config = self.reload();
        match guarded(self.poll(&config)).await {
            Ok(outcome) => debug!(?outcome, "iteration complete"),
            Err(e) => {
                let trace = backtrace();
                error!(
                    error = %error_chain(&e),
                    backtrace = trace.as_deref(),
                    "iteration failed"
                );
            }
        }
        config
    }

    /// Runs one iteration, then sleeps for that iteration's interval.
    pub async fn tick(&mut self) {
        let config = self.iterate().await;
        let interval = config.poll_interval();
        debug!(?interval, "sleeping");
        tokio::time::sleep(interval).await;
    }

    /// Runs the startup phase, then iterates forever.
    pub async fn run(mut self) {
        self.start().await;
        loop {
            self.tick().await;
        }
    }
}

async fn guarded<F, T>(future: F) -> Result<T, CycleError>
where
    F: Future<Output = Result<T, CycleError>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(CycleError::Panicked(panic_message(payload.as_ref()))),
    }
}

/// Captures the current stack when `RUST_BACKTRACE` or `RUST_LIB_BACKTRACE`
/// enables it.
fn backtrace() -> Option<String> {
    let trace = Backtrace::capture();
    (trace.status() == BacktraceStatus::Captured).then(|| trace.to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeDelta};
    use pricepoll_config::Environment;
    use pricepoll_fetch::{
        CurrencyLookup, DownloadRequest, Frame, IndexLabel, ProviderResponse, RawTimestamp,
        columns,
    };
    use pricepoll_sink::{DataPoint, FieldValue, SinkError, keys};
    use pricepoll_types::{Granularity, Period};
    use std::collections::{BTreeMap, VecDeque};
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;

    enum Step {
        Fail,
        Panic,
    }

    #[derive(Clone)]
    struct FakeProvider {
        requests: Arc<Mutex<Vec<(DownloadRequest, Instant)>>>,
        steps: Arc<Mutex<VecDeque<Step>>>,
        anchor: DateTime<Utc>,
        age: TimeDelta,
    }

    impl FakeProvider {
        fn new(steps: impl IntoIterator<Item = Step>) -> Self {
            Self {
                requests: Arc::default(),
                steps: Arc::new(Mutex::new(steps.into_iter().collect())),
                anchor: DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap(),
                age: TimeDelta::minutes(1),
            }
        }

        fn with_age(mut self, age: TimeDelta) -> Self {
            self.age = age;
            self
        }

        fn bar_time(&self) -> DateTime<Utc> {
            self.anchor - self.age
        }

        fn requests(&self) -> Vec<(DownloadRequest, Instant)> {
            self.requests.lock().unwrap().clone()
        }
    }

    // Lookups always fail; the currency comes from the downloaded frames.
    #[async_trait]
    impl CurrencyLookup for FakeProvider {
        async fn currency(&self, _symbol: &str) -> Option<String> {
            None
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
            self.requests
                .lock()
                .unwrap()
                .push((request.clone(), Instant::now()));
            let step = self.steps.lock().unwrap().pop_front();
            match step {
                Some(Step::Fail) => Err(FetchError::ServerError {
                    symbol: request.symbols.join(","),
                    status: 503,
                }),
                Some(Step::Panic) => panic!("provider exploded"),
                None => {
                    let frames = request
                        .symbols
                        .iter()
                        .map(|symbol| {
                            let mut frame = Frame::new(IndexLabel::Datetime)
                                .with_currency(Some("GBp".to_string()));
                            frame.push(
                                RawTimestamp::Zoned(self.bar_time().fixed_offset()),
                                &[
                                    (columns::CLOSE, Some(101.5)),
                                    (columns::VOLUME, Some(1000.0)),
                                ],
                            );
                            (symbol.clone(), frame)
                        })
                        .collect::<BTreeMap<_, _>>();
                    Ok(ProviderResponse::MultiSymbol(frames))
                }
            }
        }
    }

    #[derive(Clone, Default)]
    struct RecordingWriter {
        calls: Arc<Mutex<Vec<Vec<DataPoint>>>>,
    }

    impl RecordingWriter {
        fn calls(&self) -> Vec<Vec<DataPoint>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PointWriter for RecordingWriter {
        async fn write_points(
            &self,
            _bucket: &str,
            _org: &str,
            points: &[DataPoint],
        ) -> Result<(), SinkError> {
            self.calls.lock().unwrap().push(points.to_vec());
            Ok(())
        }
    }

    fn env(vars: &[(&str, &str)]) -> Environment {
        Environment::Fixed(
            vars.iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    fn poller(
        source: ConfigSource,
        provider: &FakeProvider,
        writer: &RecordingWriter,
    ) -> Poller<FakeProvider, RecordingWriter> {
        let connection = ConnectionSettings::from_environment(&env(&[]));
        Poller::new(
            source,
            Fetcher::new(provider.clone()),
            Sink::new(writer.clone()),
            &connection,
        )
    }

    fn missing_file(vars: &[(&str, &str)]) -> ConfigSource {
        ConfigSource::new("/nonexistent/pricepoll.env").with_environment(env(vars))
    }

    const ABC_EVERY_5S: &[(&str, &str)] = &[
        ("TICKERS", "ABC"),
        ("FETCH_INTERVAL_SECONDS", "5"),
        ("BACKFILL_ON_START", "false"),
    ];

    #[tokio::test]
    async fn test_iteration_writes_one_point() {
        let provider = FakeProvider::new([]);
        let writer = RecordingWriter::default();
        let mut poller = poller(missing_file(ABC_EVERY_5S), &provider, &writer);

        poller.start().await;
        poller.iterate().await;

        let calls = writer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 1);

        let point = &calls[0][0];
        assert_eq!(point.tag_value(keys::TICKER), Some("ABC"));
        assert_eq!(point.field_value(keys::CLOSE), Some(FieldValue::Float(101.5)));
        assert_eq!(point.field_value(keys::VOLUME), Some(FieldValue::Integer(1000)));
        assert_eq!(
            point.timestamp_ns(),
            provider.bar_time().timestamp_nanos_opt().unwrap()
        );

        let (request, _) = &provider.requests()[0];
        assert_eq!(request.symbols, vec!["ABC"]);
        assert_eq!(request.period, Period::Days(1));
        assert_eq!(request.granularity, Granularity::Minute1);
    }

    #[tokio::test]
    async fn test_overlapping_fetches_keep_the_same_series() {
        let provider = FakeProvider::new([]);
        let writer = RecordingWriter::default();
        let mut poller = poller(missing_file(ABC_EVERY_5S), &provider, &writer);

        poller.iterate().await;
        poller.iterate().await;

        let calls = writer.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0][0].tag_value(keys::CURRENCY), Some("GBp"));
        assert_eq!(calls[0][0].tags(), calls[1][0].tags());
        assert_eq!(calls[0][0].timestamp_ns(), calls[1][0].timestamp_ns());
    }

    #[tokio::test]
    async fn test_malformed_period_falls_back_and_polls() {
        let provider = FakeProvider::new([]);
        let writer = RecordingWriter::default();
        let vars = [
            ("TICKERS", "ABC"),
            ("BACKFILL_ON_START", "false"),
            ("YF_INTERVAL", "7m"),
            ("YF_PERIOD", "soon"),
        ];
        let mut poller = poller(missing_file(&vars), &provider, &writer);

        poller.iterate().await;

        let (request, _) = &provider.requests()[0];
        assert_eq!(request.period, Period::Days(1));
        assert_eq!(request.granularity, Granularity::Minute1);
        assert_eq!(writer.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_iteration_retries_after_interval() {
        let provider = FakeProvider::new([Step::Fail]);
        let writer = RecordingWriter::default();
        let poller = poller(missing_file(ABC_EVERY_5S), &provider, &writer);

        let result = tokio::time::timeout(Duration::from_secs(7), poller.run()).await;
        assert!(result.is_err());

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].1 - requests[0].1, Duration::from_secs(5));
        // only the second iteration reached the sink
        assert_eq!(writer.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_panicking_iteration_is_contained() {
        let provider = FakeProvider::new([Step::Panic]);
        let writer = RecordingWriter::default();
        let mut poller = poller(missing_file(ABC_EVERY_5S), &provider, &writer);

        poller.iterate().await;
        assert!(writer.calls().is_empty());

        poller.iterate().await;
        assert_eq!(writer.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_rows_are_not_written() {
        let provider = FakeProvider::new([]).with_age(TimeDelta::minutes(40));
        let writer = RecordingWriter::default();
        let mut poller = poller(missing_file(ABC_EVERY_5S), &provider, &writer);

        poller.iterate().await;
        assert_eq!(provider.requests().len(), 1);
        assert!(writer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_config_edits_apply_next_iteration() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "TICKERS=AAA").unwrap();
        writeln!(file, "FETCH_INTERVAL_SECONDS=5").unwrap();
        let source = ConfigSource::new(file.path()).with_environment(env(&[]));

        let provider = FakeProvider::new([]);
        let writer = RecordingWriter::default();
        let mut poller = poller(source, &provider, &writer);

        let first = poller.iterate().await;
        assert_eq!(first.tickers, vec!["AAA"]);

        std::fs::write(file.path(), "TICKERS=BBB,CCC\nFETCH_INTERVAL_SECONDS=10\n").unwrap();
        let second = poller.iterate().await;

        assert_eq!(second.tickers, vec!["BBB", "CCC"]);
        assert_eq!(second.poll_interval(), Duration::from_secs(10));
        assert_eq!(poller.state().current(), Some(&second));

        let requests = provider.requests();
        assert_eq!(requests[1].0.symbols, vec!["BBB", "CCC"]);
        assert_eq!(writer.calls()[1].len(), 2);
    }

    #[tokio::test]
    async fn test_backfill_writes_full_window() {
        let provider = FakeProvider::new([]).with_age(TimeDelta::days(3));
        let writer = RecordingWriter::default();
        let vars = [("TICKERS", "ABC"), ("YF_INTERVAL", "5m")];
        let mut poller = poller(missing_file(&vars), &provider, &writer);

        poller.start().await;

        let (request, _) = &provider.requests()[0];
        assert_eq!(request.period, Period::Days(60));
        assert_eq!(request.granularity, Granularity::Minute5);
        // backfill rows are not recency filtered
        assert_eq!(writer.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_backfill_failure_does_not_stop_startup() {
        let provider = FakeProvider::new([Step::Fail]);
        let writer = RecordingWriter::default();
        let vars = [("TICKERS", "ABC"), ("BACKFILL_PERIOD", "5d")];
        let mut poller = poller(missing_file(&vars), &provider, &writer);

        let config = poller.start().await;
        assert!(config.backfill_on_start);
        assert_eq!(provider.requests()[0].0.period, Period::Days(5));
        assert!(writer.calls().is_empty());

        poller.iterate().await;
        assert_eq!(writer.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_backfill_disabled_skips_fetch() {
        let provider = FakeProvider::new([]);
        let writer = RecordingWriter::default();
        let mut poller = poller(missing_file(ABC_EVERY_5S), &provider, &writer);

        poller.start().await;
        assert!(provider.requests().is_empty());
    }

    #[test]
    fn test_backfill_period() {
        let config = Config::default();
        assert_eq!(backfill_period(&config), "7d");

        let config = Config {
            fetch_interval: "1h".to_string(),
            ..Config::default()
        };
        assert_eq!(backfill_period(&config), "2y");

        let config = Config {
            backfill_period: "30d".to_string(),
            ..config
        };
        assert_eq!(backfill_period(&config), "30d");
    }

    #[test]
    fn test_cycle_error_chain() {
        let err = CycleError::from(FetchError::ServerError {
            symbol: "ABC".to_string(),
            status: 503,
        });
        assert_eq!(error_chain(&err), "fetch failed: Server error for ABC: 503");
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
