use crate::domain::errors::{ConfigError, ReportError};
use crate::domain::ports::{CollectorResponse, TelemetryPublisher};
use crate::domain::telemetry::TelemetryBatch;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderName, HeaderValue};
use tracing::debug;
use url::Url;

/// Header telling the collector which client produced the batch.
pub const CLIENT_SOURCE_HEADER: HeaderName = HeaderName::from_static("grpc-metadata-source");

/// Posts telemetry batches as JSON to the collector endpoint.
pub struct HttpTelemetryPublisher {
    client: Client,
    consumer_url: Url,
    client_source: HeaderValue,
}

impl HttpTelemetryPublisher {
    pub fn new(
        client: Client,
        consumer_url: Url,
        client_source: &str,
    ) -> Result<Self, ConfigError> {
        let client_source =
            HeaderValue::from_str(client_source).map_err(|e| ConfigError::InvalidValue {
                name: "TELEMETRY_CLIENT_SOURCE",
                value: client_source.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            consumer_url,
            client_source,
        })
    }

    pub fn consumer_url(&self) -> &Url {
        &self.consumer_url
    }
}

#[async_trait]
impl TelemetryPublisher for HttpTelemetryPublisher {
    async fn publish(&self, batch: &TelemetryBatch) -> Result<CollectorResponse, ReportError> {
        let body = batch.to_json()?;
        debug!(
            "Uploading {} metrics to {}",
            batch.metrics.len(),
            self.consumer_url
        );

        let response = self
            .client
            .post(self.consumer_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(CLIENT_SOURCE_HEADER, self.client_source.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| ReportError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| ReportError::Transport {
            reason: format!("failed to read response body: {}", e),
        })?;

        Ok(CollectorResponse {
            status,
            body: flatten_lines(&text),
        })
    }
}

/// Trim every line and join them without separators.
fn flatten_lines(text: &str) -> String {
    text.lines().map(str::trim).collect()
}
