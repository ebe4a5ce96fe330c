pub mod database;
pub mod repositories;

pub use database::Database;
pub use repositories::{
    SqliteStagedTelemetryRepository, SqliteTelemetryIdentityRepository, SqliteUsageStore,
};

use crate::domain::errors::StoreError;

/// Translate a driver error into the store taxonomy the reporter retries on.
///
/// `collection` names the table being touched, for the log line.
pub fn map_sqlx_error(collection: &str, error: sqlx::Error) -> StoreError {
    match &error {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable {
            reason: error.to_string(),
        },
        sqlx::Error::Database(db) if is_busy_code(db.code().as_deref()) => StoreError::Busy {
            reason: error.to_string(),
        },
        sqlx::Error::RowNotFound
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_) => StoreError::Decode {
            reason: error.to_string(),
        },
        _ => StoreError::Query {
            collection: collection.to_string(),
            reason: error.to_string(),
        },
    }
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6), including their extended codes.
fn is_busy_code(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i64>().ok())
        .map(|c| matches!(c & 0xff, 5 | 6))
        .unwrap_or(false)
}
