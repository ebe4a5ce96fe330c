use crate::domain::errors::ReportError;
use crate::domain::telemetry::TelemetryBatch;
use async_trait::async_trait;

/// What the collector answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorResponse {
    pub status: u16,
    pub body: String,
}

impl CollectorResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound channel to the remote telemetry collector.
///
/// Implementations return `Ok` for any HTTP response, including non-2xx ones;
/// `Err` is reserved for failures where no response was obtained.
#[async_trait]
pub trait TelemetryPublisher: Send + Sync {
    async fn publish(&self, batch: &TelemetryBatch) -> Result<CollectorResponse, ReportError>;
}
