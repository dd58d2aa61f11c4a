//! Mock database clients for testing.
//!
//! Provides in-memory implementations used by unit tests and the export
//! pipeline tests.

use super::{ColumnInfo, DatabaseClient, QueryResult, Row};
use crate::error::{ExportError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// A mock database client that returns predefined results keyed by SQL text.
#[derive(Default)]
pub struct MockDatabaseClient {
    results: HashMap<String, QueryResult>,
    executed: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with no registered results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the result returned for `sql`.
    pub fn with_result(mut self, sql: impl Into<String>, columns: &[&str], rows: Vec<Row>) -> Self {
        let columns = columns
            .iter()
            .map(|name| ColumnInfo::new(*name, "text"))
            .collect();
        self.results
            .insert(sql.into(), QueryResult::with_data(columns, rows));
        self
    }

    /// Returns every SQL string executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }

        self.results
            .get(sql)
            .cloned()
            .ok_or_else(|| ExportError::query(format!("ERROR: no mock result for: {sql}")))
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A database client whose every query fails with a connection error.
#[derive(Debug, Default)]
pub struct FailingDatabaseClient;

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(ExportError::connection("connection reset by peer"))
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        Err(ExportError::connection("connection reset by peer"))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
