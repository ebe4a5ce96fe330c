mod identity_repository;
mod staged_telemetry_repository;
mod usage_store;

pub use identity_repository::SqliteTelemetryIdentityRepository;
pub use staged_telemetry_repository::SqliteStagedTelemetryRepository;
pub use usage_store::{SqliteUsageStore, collection_table};
