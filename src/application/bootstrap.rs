use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::application::telemetry::{
    CollectionRetryConfig, TelemetryReporter, load_or_create_identifier,
};
use crate::config::{Config, TelemetryEnvConfig};
use crate::domain::repositories::StagedTelemetryRepository;
use crate::infrastructure::collector::HttpTelemetryPublisher;
use crate::infrastructure::core::HttpClientFactory;
use crate::infrastructure::persistence::Database;
use crate::infrastructure::persistence::repositories::{
    SqliteStagedTelemetryRepository, SqliteTelemetryIdentityRepository, SqliteUsageStore,
};

pub struct TelemetryHandle {
    pub db: Database,
    pub reporter: Arc<TelemetryReporter>,
    pub staging_repository: Arc<dyn StagedTelemetryRepository>,
}

pub struct TelemetryBootstrap;

impl TelemetryBootstrap {
    pub async fn init(config: &Config) -> Result<TelemetryHandle> {
        info!("Initializing Database at {}", config.database.url);

        let db = Database::new(&config.database.url, config.database.max_connections)
            .await
            .context("Failed to initialize database")?;

        Self::with_database(db, &config.telemetry).await
    }

    /// Wire the reporter against an already opened store.
    pub async fn with_database(
        db: Database,
        telemetry: &TelemetryEnvConfig,
    ) -> Result<TelemetryHandle> {
        let consumer_url = telemetry
            .consumer_url
            .clone()
            .context("TELEMETRY_CONSUMER_URL is required when telemetry is enabled")?;

        let identity_repo = SqliteTelemetryIdentityRepository::new(db.clone());
        let telemetry_id = load_or_create_identifier(&identity_repo).await;

        let client = HttpClientFactory::create_client(telemetry.request_timeout);
        let publisher = HttpTelemetryPublisher::new(client, consumer_url, &telemetry.client_source)
            .context("Invalid telemetry publisher settings")?;
        info!("Telemetry consumer: {}", publisher.consumer_url());

        let staging_repository: Arc<dyn StagedTelemetryRepository> =
            Arc::new(SqliteStagedTelemetryRepository::new(db.clone()));

        let reporter = Arc::new(TelemetryReporter::new(
            Arc::new(SqliteUsageStore::new(db.clone())),
            staging_repository.clone(),
            Arc::new(publisher),
            telemetry_id,
            CollectionRetryConfig {
                max_attempts: telemetry.max_collection_attempts,
                delay: telemetry.retry_delay,
            },
        ));

        Ok(TelemetryHandle {
            db,
            reporter,
            staging_repository,
        })
    }
}
