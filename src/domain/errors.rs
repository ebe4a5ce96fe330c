use thiserror::Error;

/// Errors raised by the store while counting or staging telemetry
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Store busy: {reason}")]
    Busy { reason: String },

    #[error("Query on {collection} failed: {reason}")]
    Query { collection: String, reason: String },

    #[error("Unexpected row data: {reason}")]
    Decode { reason: String },
}

impl StoreError {
    /// Whether restarting the whole collection has a chance of succeeding.
    ///
    /// Connectivity loss and lock contention are transient; a broken query or
    /// a missing table will fail the same way on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. } | StoreError::Busy { .. })
    }
}

/// Errors raised while shipping a batch to the collector
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to serialize telemetry batch: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport failure: {reason}")]
    Transport { reason: String },

    #[error("Collector rejected batch with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Startup configuration problems
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting {name}")]
    Missing { name: &'static str },

    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid consumer URL {url:?}: {reason}")]
    InvalidConsumerUrl { url: String, reason: String },
}
