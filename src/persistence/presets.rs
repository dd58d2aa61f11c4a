//! Preset query persistence.
//!
//! Presets are `(table_name, sql)` pairs listed in insertion order. A table
//! name may appear more than once.

use crate::error::{ExportError, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;

/// A stored query together with the table name its export is named after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PresetQuery {
    pub table_name: String,
    pub sql: String,
}

impl PresetQuery {
    pub fn new(table_name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            sql: sql.into(),
        }
    }
}

/// Returns every preset in the order it was saved.
pub async fn retrieve_preset_queries(pool: &SqlitePool) -> Result<Vec<PresetQuery>> {
    sqlx::query_as::<_, PresetQuery>("SELECT table_name, sql FROM preset_queries ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(|e| ExportError::persistence(format!("Failed to list preset queries: {e}")))
}

/// Saves a new preset.
pub async fn save_query_to_db(pool: &SqlitePool, table_name: &str, sql: &str) -> Result<i64> {
    validate(table_name, sql)?;

    let result = sqlx::query("INSERT INTO preset_queries (table_name, sql) VALUES (?, ?)")
        .bind(table_name)
        .bind(sql)
        .execute(pool)
        .await
        .map_err(|e| ExportError::persistence(format!("Failed to save preset query: {e}")))?;

    Ok(result.last_insert_rowid())
}

/// Replaces the SQL of every preset named `table_name`.
///
/// Returns the number of presets updated; fails if none matched.
pub async fn update_query_in_database(
    pool: &SqlitePool,
    table_name: &str,
    new_sql: &str,
) -> Result<u64> {
    validate(table_name, new_sql)?;

    let result = sqlx::query(
        "UPDATE preset_queries SET sql = ?, updated_at = datetime('now') WHERE table_name = ?",
    )
    .bind(new_sql)
    .bind(table_name)
    .execute(pool)
    .await
    .map_err(|e| ExportError::persistence(format!("Failed to update preset query: {e}")))?;

    if result.rows_affected() == 0 {
        return Err(ExportError::persistence(format!(
            "Preset query '{}' not found",
            table_name
        )));
    }

    Ok(result.rows_affected())
}

/// Deletes every preset named `table_name`.
pub async fn delete_preset(pool: &SqlitePool, table_name: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM preset_queries WHERE table_name = ?")
        .bind(table_name)
        .execute(pool)
        .await
        .map_err(|e| ExportError::persistence(format!("Failed to delete preset query: {e}")))?;

    if result.rows_affected() == 0 {
        return Err(ExportError::persistence(format!(
            "Preset query '{}' not found",
            table_name
        )));
    }

    Ok(result.rows_affected())
}

fn validate(table_name: &str, sql: &str) -> Result<()> {
    if table_name.trim().is_empty() {
        return Err(ExportError::input("Table name must not be empty"));
    }
    if sql.trim().is_empty() {
        return Err(ExportError::input("SQL must not be empty"));
    }
    Ok(())
}
