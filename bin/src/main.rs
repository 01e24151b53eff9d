//! pricepoll - Poll market prices from Yahoo Finance into InfluxDB.

use anyhow::{Context, Result};
use clap::Parser;
use pricepoll_lib::DEFAULT_ENV_PATH;
use pricepoll_lib::prelude::*;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pricepoll")]
#[command(about = "Poll market prices from Yahoo Finance into InfluxDB", long_about = None)]
#[command(version)]
struct Cli {
    /// Env file re-read before every poll (TICKERS, FETCH_INTERVAL_SECONDS, ...)
    #[arg(long, default_value = DEFAULT_ENV_PATH)]
    env_file: PathBuf,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Log level used when `RUST_LOG` is not set.
    const fn default_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Resolves when the process is asked to stop, with the signal's name.
async fn shutdown_signal() -> Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                Ok("SIGINT")
            }
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")?;
        Ok("Ctrl-C")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.default_level());

    let connection = ConnectionSettings::from_env();
    let source = ConfigSource::new(cli.env_file.clone());
    info!(
        version = env!("CARGO_PKG_VERSION"),
        influx_url = %connection.url,
        org = %connection.org,
        bucket = %connection.bucket,
        tickers = ?source.load().tickers,
        env_file = %cli.env_file.display(),
        "starting pricepoll"
    );

    let client = InfluxClient::connect(&connection, WriteOptions::default())
        .await
        .with_context(|| format!("Failed to connect to InfluxDB at {}", connection.url))?;
    let provider = YahooProvider::with_defaults().context("Failed to create Yahoo Finance client")?;

    let poller = Poller::new(source, Fetcher::new(provider), Sink::new(client), &connection);

    tokio::select! {
        () = poller.run() => {}
        signal = shutdown_signal() => {
            let signal = signal?;
            info!(signal, "shutting down");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["pricepoll"]);
        assert_eq!(cli.env_file, PathBuf::from("/app/.env"));
        assert_eq!(cli.default_level(), "info");
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::parse_from(["pricepoll", "-vv", "--env-file", "local.env"]);
        assert_eq!(cli.default_level(), "trace");
        assert_eq!(cli.env_file, PathBuf::from("local.env"));

        let cli = Cli::parse_from(["pricepoll", "-q"]);
        assert_eq!(cli.default_level(), "warn");

        assert!(Cli::try_parse_from(["pricepoll", "-q", "-v"]).is_err());
    }
}
