//! Database abstraction layer for db-export.
//!
//! Provides a trait-based interface for database operations, allowing
//! different database backends to be used interchangeably by the export engine.

mod mock;
mod postgres;
mod sqlite;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    Sqlite,
}

/// Creates a database client for the given backend and configuration.
///
/// This is the central factory function for database sessions.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    match config.backend {
        DatabaseBackend::Postgres => {
            let client = PostgresClient::connect(config).await?;
            Ok(Box::new(client))
        }
        DatabaseBackend::Sqlite => {
            let client = SqliteClient::connect(config).await?;
            Ok(Box::new(client))
        }
    }
}

/// Builds a `SELECT *` query for a whole table, quoting the identifier.
pub fn table_query(table_name: &str) -> String {
    format!("SELECT * FROM \"{}\"", table_name.replace('"', "\"\""))
}

/// Trait defining the interface for database clients.
///
/// Each call acquires a connection for its own duration and releases it on
/// return, so a client can be shared across sequential exports.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a SQL query and returns the full result set.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Lists user tables, sorted by name.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
