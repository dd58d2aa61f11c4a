//! State database schema setup.
//!
//! The schema version lives in SQLite's `PRAGMA user_version`; 0 is a fresh file.

use crate::error::{ExportError, Result};
use sqlx::sqlite::SqlitePool;
use tracing::info;

const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS preset_queries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        table_name TEXT NOT NULL,
        sql TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    )
    "#,
    // `table_name` may repeat; presets are addressed by list position.
    "CREATE INDEX IF NOT EXISTS idx_preset_queries_table ON preset_queries(table_name)",
];

/// Creates the preset store on a fresh database and rejects newer schemas.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current = schema_version(pool).await?;

    if current > SCHEMA_VERSION {
        return Err(ExportError::persistence(format!(
            "Database schema version ({current}) is newer than supported version \
             ({SCHEMA_VERSION}). Please upgrade db-export to the latest version."
        )));
    }
    if current == SCHEMA_VERSION {
        return Ok(());
    }

    info!("Creating state database schema v{}", SCHEMA_VERSION);
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ExportError::persistence(format!("Failed to start migration: {e}")))?;
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| ExportError::persistence(format!("Failed to create schema: {e}")))?;
    }
    // PRAGMA arguments cannot be bound.
    sqlx::query(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
        .execute(&mut *tx)
        .await
        .map_err(|e| ExportError::persistence(format!("Failed to record schema version: {e}")))?;
    tx.commit()
        .await
        .map_err(|e| ExportError::persistence(format!("Failed to commit migration: {e}")))
}

async fn schema_version(pool: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar::<_, i64>("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .map_err(|e| ExportError::persistence(format!("Failed to get schema version: {e}")))
}
