//! InfluxDB connection settings.

use crate::Environment;

/// Environment variable holding the InfluxDB base URL.
pub(crate) const INFLUX_URL: &str = "INFLUX_URL";
/// Environment variable holding the InfluxDB API token.
pub(crate) const INFLUX_TOKEN: &str = "INFLUX_TOKEN";
/// Environment variable holding the InfluxDB organization.
pub(crate) const INFLUX_ORG: &str = "INFLUX_ORG";
/// Environment variable holding the InfluxDB bucket.
pub(crate) const INFLUX_BUCKET: &str = "INFLUX_BUCKET";

/// Where and as whom to write points.
///
/// Read once at startup and never reloaded: changing these requires a
/// restart because the client connection is reused for the process lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Base URL of the InfluxDB server.
    pub url: String,
    /// API token, if authentication is enabled.
    pub token: Option<String>,
    /// Organization that owns the bucket.
    pub org: String,
    /// Destination bucket.
    pub bucket: String,
}

impl ConnectionSettings {
    /// Reads the settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_environment(&Environment::Process)
    }

    /// Reads the settings from the given environment layer.
    #[must_use]
    pub fn from_environment(env: &Environment) -> Self {
        let or_default =
            |key: &str, default: &str| env.get(key).unwrap_or_else(|| default.to_string());

        Self {
            url: or_default(INFLUX_URL, "http://influxdb:8086"),
            token: env.get(INFLUX_TOKEN).filter(|t| !t.is_empty()),
            org: or_default(INFLUX_ORG, "stocks"),
            bucket: or_default(INFLUX_BUCKET, "lse"),
        }
    }
}

// The token must never end up in a log line.
impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("org", &self.org)
            .field("bucket", &self.bucket)
            .finish()
    }
}
