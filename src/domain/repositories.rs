//! Repository Pattern Abstractions
//!
//! Storage seams used by the telemetry reporter. The reporter only ever sees
//! these traits, so tests drive it with in-memory fakes while production wires
//! in the SQLite implementations from `infrastructure::persistence`.
//!
//! - `UsageStore` / `CountSession`: read-only counting of entity collections
//! - `StagedTelemetryRepository`: the "last collected" staging table
//! - `TelemetryIdentityRepository`: the persisted process identifier

use crate::domain::errors::StoreError;
use crate::domain::telemetry::{MetricKey, StagedTelemetryRecord};
use async_trait::async_trait;

/// Source of entity counts.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Open a scoped read session. Every count of one collection attempt goes
    /// through the same session; dropping it releases the underlying
    /// connection.
    async fn open_read_session(&self) -> Result<Box<dyn CountSession>, StoreError>;
}

/// A single logical read against the store.
#[async_trait]
pub trait CountSession: Send {
    /// Count all rows of the collection backing `key`.
    async fn count(&mut self, key: MetricKey) -> Result<u64, StoreError>;
}

/// Write path for staged telemetry records
#[async_trait]
pub trait StagedTelemetryRepository: Send + Sync {
    /// Remove every staged record. Returns the number of rows removed.
    async fn delete_all(&self) -> Result<u64, StoreError>;

    /// Insert one staged record
    async fn insert(&self, record: &StagedTelemetryRecord) -> Result<(), StoreError>;

    /// Read back the currently staged records
    async fn list(&self) -> Result<Vec<StagedTelemetryRecord>, StoreError>;
}

/// Persistence for the process-wide telemetry identifier
#[async_trait]
pub trait TelemetryIdentityRepository: Send + Sync {
    async fn load(&self) -> Result<Option<String>, StoreError>;

    async fn save(&self, id: &str) -> Result<(), StoreError>;
}
