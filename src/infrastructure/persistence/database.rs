use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

/// Shared pool handle for the store
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str, max_connections: u32) -> Result<Self> {
        // Ensure the directory exists if it's a file path
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        // Every in-memory connection is its own database, so keep exactly one
        // and never let the pool recycle it.
        let pool_options = if db_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Connected to database: {}", db_url);

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// In-memory store, mostly useful for tests.
    pub async fn in_memory() -> Result<Self> {
        Self::new("sqlite::memory:", 1).await
    }

    /// Create the tables owned by the reporter. Entity tables that get
    /// counted belong to the host schema and are not created here.
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        // 1. Staged telemetry (replaced on every tick)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS telemetry_information (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                telemetry_key TEXT NOT NULL,
                telemetry_value INTEGER NOT NULL,
                value_type TEXT NOT NULL DEFAULT 'NUMBER',
                collected_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create telemetry_information table")?;

        // 2. Process identifier (single row)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS telemetry_identity (
                slot INTEGER PRIMARY KEY CHECK (slot = 1),
                telemetry_id TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create telemetry_identity table")?;

        info!("Telemetry schema initialized.");
        Ok(())
    }
}
