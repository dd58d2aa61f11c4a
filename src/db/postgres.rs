//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient` trait
//! for PostgreSQL databases using sqlx.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, DatabaseClient, QueryResult, Row, Value};
use crate::error::{ExportError, Result};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::types::{Oid, PgInterval, PgMoney, PgTimeTz};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow, PgTypeInfo, PgTypeKind, Postgres};
use sqlx::types::{BigDecimal, Uuid};
use sqlx::{Column as SqlxColumn, Decode, Executor, Row as SqlxRow, Statement, Type, TypeInfo};
use std::time::{Duration, Instant};
use tracing::debug;

/// PostgreSQL database client.
#[derive(Debug)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Connects to the database described by `config`.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;

        // One connection is enough: exports run one after another.
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Connected to {}", config.display_string());
        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| ExportError::connection(e.to_string()))?;

        let start = Instant::now();
        let result = sqlx::query(sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| ExportError::query(format_query_error(e)))?;
        let execution_time = start.elapsed();

        // Column metadata comes from the first row, or from the prepared
        // statement when the result set is empty.
        let columns: Vec<ColumnInfo> = match result.first() {
            Some(first_row) => first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            None => {
                let statement = (&mut *conn)
                    .prepare(sql)
                    .await
                    .map_err(|e| ExportError::query(format_query_error(e)))?;
                statement
                    .columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect()
            }
        };

        let rows = result
            .iter()
            .map(convert_row)
            .collect::<Result<Vec<Row>>>()?;
        let row_count = rows.len();

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
            row_count,
        })
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = 'public' AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ExportError::query(format!("Failed to fetch tables: {e}")))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Result<Row> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
///
/// Numeric, UUID, interval, money and array values become text so no
/// precision is lost. Types without a decoder fail the query.
fn convert_value(row: &PgRow, index: usize, type_info: &PgTypeInfo) -> Result<Value> {
    let value = match type_info.name().to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => decode::<bool>(row, index)?.map(Value::Bool),
        "INT2" | "SMALLINT" => decode::<i16>(row, index)?.map(|v| Value::Int(v.into())),
        "INT4" | "INT" | "INTEGER" => decode::<i32>(row, index)?.map(|v| Value::Int(v.into())),
        "INT8" | "BIGINT" => decode::<i64>(row, index)?.map(Value::Int),
        "OID" => decode::<Oid>(row, index)?.map(|v| Value::Int(v.0.into())),
        "FLOAT4" | "REAL" => decode::<f32>(row, index)?.map(|v| Value::Float(v.into())),
        "FLOAT8" | "DOUBLE PRECISION" => decode::<f64>(row, index)?.map(Value::Float),
        "NUMERIC" => decode::<BigDecimal>(row, index)?.map(|v| Value::String(v.to_plain_string())),
        "MONEY" => decode::<PgMoney>(row, index)?.map(|v| Value::String(format_money(v.0))),
        "UUID" => decode::<Uuid>(row, index)?.map(|v| Value::String(v.to_string())),
        "BYTEA" => decode::<Vec<u8>>(row, index)?.map(Value::Bytes),

        "DATE" => decode::<chrono::NaiveDate>(row, index)?.map(|v| Value::String(v.to_string())),
        "TIME" => decode::<chrono::NaiveTime>(row, index)?.map(|v| Value::String(v.to_string())),
        "TIMETZ" => decode::<PgTimeTz<chrono::NaiveTime, chrono::FixedOffset>>(row, index)?
            .map(|v| Value::String(format!("{}{}", v.time, v.offset))),
        "TIMESTAMP" => {
            decode::<chrono::NaiveDateTime>(row, index)?.map(|v| Value::String(v.to_string()))
        }
        "TIMESTAMPTZ" => decode::<chrono::DateTime<chrono::Utc>>(row, index)?
            .map(|v| Value::String(v.to_rfc3339())),
        "INTERVAL" => decode::<PgInterval>(row, index)?.map(|v| Value::String(format_interval(&v))),

        "JSON" | "JSONB" => {
            decode::<serde_json::Value>(row, index)?.map(|v| Value::String(v.to_string()))
        }

        "BOOL[]" => decode_array::<bool, _>(row, index, JsonValue::from)?,
        "INT2[]" => decode_array::<i16, _>(row, index, JsonValue::from)?,
        "INT4[]" => decode_array::<i32, _>(row, index, JsonValue::from)?,
        "INT8[]" => decode_array::<i64, _>(row, index, JsonValue::from)?,
        "FLOAT4[]" => decode_array::<f32, _>(row, index, JsonValue::from)?,
        "FLOAT8[]" => decode_array::<f64, _>(row, index, JsonValue::from)?,
        "NUMERIC[]" => decode_array::<BigDecimal, _>(row, index, |v| {
            JsonValue::String(v.to_plain_string())
        })?,
        "UUID[]" => decode_array::<Uuid, _>(row, index, |v| JsonValue::String(v.to_string()))?,
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => {
            decode_array::<String, _>(row, index, JsonValue::String)?
        }

        // Enum labels travel as text.
        _ if matches!(type_info.kind(), PgTypeKind::Enum(_)) => row
            .try_get_unchecked::<Option<String>, _>(index)
            .map_err(|e| decode_error(row, index, e))?
            .map(Value::String),

        other => match row.try_get::<Option<String>, _>(index) {
            Ok(v) => v.map(Value::String),
            Err(e) => {
                let name = row.column(index).name();
                return Err(ExportError::query(format!(
                    "Cannot export column '{name}' of type {other}: {e}. \
                     Cast it to text in the query, e.g. {name}::text"
                )));
            }
        },
    };

    Ok(value.unwrap_or(Value::Null))
}

fn decode<'r, T>(row: &'r PgRow, index: usize) -> Result<Option<T>>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<Option<T>, _>(index)
        .map_err(|e| decode_error(row, index, e))
}

/// Decodes a one-dimensional array and renders it as JSON text.
fn decode_array<'r, T, F>(row: &'r PgRow, index: usize, to_json: F) -> Result<Option<Value>>
where
    Vec<Option<T>>: Decode<'r, Postgres> + Type<Postgres>,
    F: Fn(T) -> JsonValue,
{
    let Some(items) = decode::<Vec<Option<T>>>(row, index)? else {
        return Ok(None);
    };
    let items: Vec<JsonValue> = items
        .into_iter()
        .map(|item| item.map(&to_json).unwrap_or(JsonValue::Null))
        .collect();
    Ok(Some(Value::String(JsonValue::Array(items).to_string())))
}

fn decode_error(row: &PgRow, index: usize, error: sqlx::Error) -> ExportError {
    ExportError::query(format!(
        "Cannot decode column '{}': {error}",
        row.column(index).name()
    ))
}

/// Renders an interval the way PostgreSQL's default output style does,
/// e.g. `1 year 2 mons 3 days 04:05:06.5`.
fn format_interval(interval: &PgInterval) -> String {
    let years = interval.months / 12;
    let months = interval.months % 12;

    let mut parts: Vec<String> = [(years, "year"), (months, "mon"), (interval.days, "day")]
        .into_iter()
        .filter(|(n, _)| *n != 0)
        .map(|(n, unit)| format!("{n} {unit}{}", if n == 1 { "" } else { "s" }))
        .collect();

    if interval.microseconds != 0 || parts.is_empty() {
        let sign = if interval.microseconds < 0 { "-" } else { "" };
        let micros = interval.microseconds.unsigned_abs();
        let secs = micros / 1_000_000;
        let mut time = format!(
            "{sign}{:02}:{:02}:{:02}",
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        );
        let fraction = micros % 1_000_000;
        if fraction != 0 {
            time.push_str(format!(".{fraction:06}").trim_end_matches('0'));
        }
        parts.push(time);
    }

    parts.join(" ")
}

/// Renders a MONEY amount (in cents) with two decimal places.
fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> ExportError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.port;
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        ExportError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        ExportError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        ExportError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        ExportError::connection(
            "Server requires SSL. Add '?sslmode=require' to connection string.".to_string(),
        )
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        ExportError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        ExportError::connection(error.to_string())
    }
}

/// Formats a query error with PostgreSQL detail and hint when available.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }
        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }
        if let Some(table) = pg_error.table() {
            result.push_str("\n  TABLE: ");
            result.push_str(table);
        }
        if let Some(column) = pg_error.column() {
            result.push_str("\n  COLUMN: ");
            result.push_str(column);
        }
    }

    result
}
