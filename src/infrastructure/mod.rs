pub mod collector;
pub mod core;
pub mod persistence;

pub use collector::HttpTelemetryPublisher;
pub use self::core::HttpClientFactory;
pub use persistence::{
    Database, SqliteStagedTelemetryRepository, SqliteTelemetryIdentityRepository,
    SqliteUsageStore,
};
