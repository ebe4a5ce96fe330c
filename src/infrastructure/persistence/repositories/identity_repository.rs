use crate::domain::errors::StoreError;
use crate::domain::repositories::TelemetryIdentityRepository;
use crate::infrastructure::persistence::database::Database;
use crate::infrastructure::persistence::map_sqlx_error;
use async_trait::async_trait;

const TABLE: &str = "telemetry_identity";

pub struct SqliteTelemetryIdentityRepository {
    database: Database,
}

impl SqliteTelemetryIdentityRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl TelemetryIdentityRepository for SqliteTelemetryIdentityRepository {
    async fn load(&self) -> Result<Option<String>, StoreError> {
        sqlx::query_scalar::<_, String>(
            "SELECT telemetry_id FROM telemetry_identity WHERE slot = 1",
        )
        .fetch_optional(&self.database.pool)
        .await
        .map_err(|e| map_sqlx_error(TABLE, e))
    }

    /// Upsert the single identity row
    async fn save(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO telemetry_identity (slot, telemetry_id)
            VALUES (1, ?)
            ON CONFLICT(slot) DO UPDATE SET telemetry_id = excluded.telemetry_id
            "#,
        )
        .bind(id)
        .execute(&self.database.pool)
        .await
        .map_err(|e| map_sqlx_error(TABLE, e))?;

        Ok(())
    }
}
