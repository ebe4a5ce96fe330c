use crate::domain::errors::StoreError;
use crate::domain::repositories::StagedTelemetryRepository;
use crate::domain::telemetry::{Metric, MetricKey, StagedTelemetryRecord};
use crate::infrastructure::persistence::database::Database;
use crate::infrastructure::persistence::map_sqlx_error;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sqlx::Row;

const TABLE: &str = "telemetry_information";

pub struct SqliteStagedTelemetryRepository {
    database: Database,
}

impl SqliteStagedTelemetryRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl StagedTelemetryRepository for SqliteStagedTelemetryRepository {
    async fn delete_all(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM telemetry_information")
            .execute(&self.database.pool)
            .await
            .map_err(|e| map_sqlx_error(TABLE, e))?;

        Ok(result.rows_affected())
    }

    async fn insert(&self, record: &StagedTelemetryRecord) -> Result<(), StoreError> {
        let value = i64::try_from(record.metric.value()).map_err(|_| StoreError::Decode {
            reason: format!(
                "count {} for {} does not fit in a column",
                record.metric.value(),
                record.metric.key()
            ),
        })?;

        sqlx::query(
            r#"
            INSERT INTO telemetry_information
                (telemetry_key, telemetry_value, value_type, collected_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(record.metric.key().as_str())
        .bind(value)
        .bind(record.metric.value_type().to_string())
        .bind(record.collected_at.timestamp_millis())
        .execute(&self.database.pool)
        .await
        .map_err(|e| map_sqlx_error(TABLE, e))?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<StagedTelemetryRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT telemetry_key, telemetry_value, collected_at
            FROM telemetry_information
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.database.pool)
        .await
        .map_err(|e| map_sqlx_error(TABLE, e))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let key_str: String = row
                .try_get("telemetry_key")
                .map_err(|e| map_sqlx_error(TABLE, e))?;
            let value: i64 = row
                .try_get("telemetry_value")
                .map_err(|e| map_sqlx_error(TABLE, e))?;
            let collected_ms: i64 = row
                .try_get("collected_at")
                .map_err(|e| map_sqlx_error(TABLE, e))?;

            let key = key_str
                .parse::<MetricKey>()
                .map_err(|e| StoreError::Decode {
                    reason: e.to_string(),
                })?;
            let value = u64::try_from(value).map_err(|_| StoreError::Decode {
                reason: format!("negative staged value {} for {}", value, key),
            })?;
            let collected_at = Utc
                .timestamp_millis_opt(collected_ms)
                .single()
                .ok_or_else(|| StoreError::Decode {
                    reason: format!("invalid timestamp {}", collected_ms),
                })?;

            records.push(StagedTelemetryRecord::new(
                Metric::count(key, value),
                collected_at,
            ));
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: MetricKey, value: u64) -> StagedTelemetryRecord {
        StagedTelemetryRecord::new(
            Metric::count(key, value),
            Utc.timestamp_millis_opt(1_760_000_000_000).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_insert_list_and_delete() {
        let database = Database::in_memory().await.unwrap();
        let repo = SqliteStagedTelemetryRepository::new(database);

        repo.insert(&record(MetricKey::Projects, 3)).await.unwrap();
        repo.insert(&record(MetricKey::Experiments, 5)).await.unwrap();

        let staged = repo.list().await.unwrap();
        assert_eq!(staged.len(), 2);
        assert_eq!(staged[0], record(MetricKey::Projects, 3));
        assert_eq!(staged[1].metric.key(), MetricKey::Experiments);
        assert_eq!(staged[1].metric.value(), 5);

        assert_eq!(repo.delete_all().await.unwrap(), 2);
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_all_on_empty_table() {
        let database = Database::in_memory().await.unwrap();
        let repo = SqliteStagedTelemetryRepository::new(database);
        assert_eq!(repo.delete_all().await.unwrap(), 0);
    }
}
