use crate::domain::errors::StoreError;
use crate::domain::repositories::{CountSession, UsageStore};
use crate::domain::telemetry::MetricKey;
use crate::infrastructure::persistence::database::Database;
use crate::infrastructure::persistence::map_sqlx_error;
use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};
use tracing::debug;

/// Host table backing each metric key.
pub fn collection_table(key: MetricKey) -> &'static str {
    match key {
        MetricKey::Projects => "project",
        MetricKey::Experiments => "experiment",
        MetricKey::ExperimentRuns => "experiment_run",
        MetricKey::Datasets => "dataset",
        MetricKey::DatasetVersions => "dataset_version",
        MetricKey::Comments => "comment",
        MetricKey::CodeVersions => "code_version",
        MetricKey::Attributes => "attribute",
        MetricKey::Artifacts => "artifact",
        MetricKey::Features => "feature",
        MetricKey::GitSnapshots => "git_snapshot",
        MetricKey::KeyValues => "keyvalue",
        MetricKey::Observations => "observation",
        MetricKey::TagMappings => "tag_mapping",
    }
}

pub struct SqliteUsageStore {
    database: Database,
}

impl SqliteUsageStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl UsageStore for SqliteUsageStore {
    async fn open_read_session(&self) -> Result<Box<dyn CountSession>, StoreError> {
        let tx = self
            .database
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("session", e))?;

        Ok(Box::new(SqliteCountSession { tx }))
    }
}

/// Read transaction on one pooled connection. Dropping it rolls back and
/// returns the connection to the pool, whatever happened in between.
struct SqliteCountSession {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl CountSession for SqliteCountSession {
    async fn count(&mut self, key: MetricKey) -> Result<u64, StoreError> {
        let table = collection_table(key);
        // Table names come from a fixed match, never from input.
        let sql = format!("SELECT COUNT(*) FROM {}", table);

        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error(table, e))?;

        debug!("Counted {} rows in {}", count, table);

        u64::try_from(count).map_err(|_| StoreError::Decode {
            reason: format!("negative row count {} for {}", count, table),
        })
    }
}
