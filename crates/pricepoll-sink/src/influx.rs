//! InfluxDB v2 HTTP write client.

use async_trait::async_trait;
use pricepoll_config::ConnectionSettings;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, Url};
use std::time::Duration;
use tracing::debug;

use crate::line_protocol::encode_batch;
use crate::{DataPoint, PointWriter, SinkError, WriteOptions};

/// Client for one InfluxDB server, created once and reused for every write.
#[derive(Clone)]
pub struct InfluxClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    options: WriteOptions,
}

impl InfluxClient {
    /// Creates a client without contacting the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// created.
    pub fn new(settings: &ConnectionSettings, options: WriteOptions) -> Result<Self, SinkError> {
        let base_url = Url::parse(&settings.url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| SinkError::InvalidUrl(settings.url.clone()))?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: settings.token.clone(),
            options,
        })
    }

    /// Creates a client and checks that the server is healthy.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created or the health check
    /// fails.
    pub async fn connect(
        settings: &ConnectionSettings,
        options: WriteOptions,
    ) -> Result<Self, SinkError> {
        let client = Self::new(settings, options)?;
        client.health().await?;
        Ok(client)
    }

    /// Checks the server's `/health` endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or not healthy.
    pub async fn health(&self) -> Result<(), SinkError> {
        let response = self
            .client
            .get(self.endpoint(&["health"]))
            .timeout(self.options.flush_interval)
            .send()
            .await?;
        check_status(response).await?;
        debug!(url = %self.base_url, "InfluxDB is healthy");
        Ok(())
    }

    /// Returns the batching options.
    #[must_use]
    pub const fn options(&self) -> &WriteOptions {
        &self.options
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn write_url(&self, bucket: &str, org: &str) -> Url {
        let mut url = self.endpoint(&["api", "v2", "write"]);
        url.query_pairs_mut()
            .append_pair("org", org)
            .append_pair("bucket", bucket)
            .append_pair("precision", "ns");
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Token {token}")),
            None => request,
        }
    }
}

#[async_trait]
impl PointWriter for InfluxClient {
    async fn write_points(
        &self,
        bucket: &str,
        org: &str,
        points: &[DataPoint],
    ) -> Result<(), SinkError> {
        let url = self.write_url(bucket, org);
        let mut committed = 0;

        for batch in points.chunks(self.options.batch_size.max(1)) {
            self.flush(&url, batch)
                .await
                .map_err(|e| SinkError::after_commit(committed, e))?;
            committed += batch.len();
            debug!(points = batch.len(), committed, bucket, "flushed batch");
        }
        Ok(())
    }
}

impl InfluxClient {
    async fn flush(&self, url: &Url, batch: &[DataPoint]) -> Result<(), SinkError> {
        let request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .timeout(self.options.flush_interval)
            .body(encode_batch(batch));

        let response = self.authorize(request).send().await?;
        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<(), SinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(SinkError::Status {
        status: status.as_u16(),
        body,
    })
}

// The token must never end up in a log line.
impl std::fmt::Debug for InfluxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
