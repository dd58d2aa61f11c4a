//! PostgreSQL export tests.
//!
//! Set DATABASE_URL to run them; otherwise they are skipped.

use db_export::config::ConnectionConfig;
use db_export::db::{DatabaseClient, PostgresClient, Value};
use db_export::error::ExportError;
use db_export::export::{ExportEngine, ExportFormat};
use tempfile::tempdir;

/// Helper to create a test client.
async fn get_test_client() -> Option<PostgresClient> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    PostgresClient::connect(&config).await.ok()
}

#[tokio::test]
async fn test_execute_simple_select() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .execute_query("SELECT 1::int8 AS num, 'hello'::text AS greeting, NULL::text AS nothing")
        .await
        .unwrap();

    assert_eq!(result.column_names(), vec!["num", "greeting", "nothing"]);
    assert_eq!(
        result.rows[0],
        vec![Value::Int(1), Value::from("hello"), Value::Null]
    );
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_empty_result_keeps_columns() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .execute_query("SELECT 1 AS a, 2 AS b WHERE false")
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(result.column_names(), vec!["a", "b"]);
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_export_to_csv() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let out = tempdir().unwrap();

    let outcome = ExportEngine::new(&client)
        .export_table_data(
            "numbers",
            "SELECT n FROM generate_series(1, 3) AS n",
            ExportFormat::Csv,
            out.path(),
        )
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(outcome.path).unwrap(),
        "n\n1\n2\n3\n"
    );
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_non_trivial_types_keep_their_values() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .execute_query(
            "SELECT 19.99::numeric AS price, \
                    'a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11'::uuid AS id, \
                    interval '1 day 02:00:00' AS wait, \
                    ARRAY[1, NULL, 3]::int4[] AS scores, \
                    ARRAY['a', 'b']::text[] AS tags, \
                    12.34::money AS fee, \
                    NULL::numeric AS missing",
        )
        .await
        .unwrap();

    assert_eq!(
        result.rows[0],
        vec![
            Value::from("19.99"),
            Value::from("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11"),
            Value::from("1 day 02:00:00"),
            Value::from("[1,null,3]"),
            Value::from("[\"a\",\"b\"]"),
            Value::from("12.34"),
            Value::Null,
        ]
    );
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_numeric_export_to_csv() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let out = tempdir().unwrap();

    let outcome = ExportEngine::new(&client)
        .export_table_data(
            "prices",
            "SELECT 123456789012345678901234567890.123::numeric AS amount",
            ExportFormat::Csv,
            out.path(),
        )
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(outcome.path).unwrap(),
        "amount\n123456789012345678901234567890.123\n"
    );
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_undecodable_type_fails_instead_of_exporting_null() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let error = client
        .execute_query("SELECT '192.168.0.1'::inet AS addr")
        .await
        .unwrap_err();

    assert!(matches!(error, ExportError::Query(_)));
    assert!(error.to_string().contains("addr::text"));

    let result = client
        .execute_query("SELECT '192.168.0.1'::inet::text AS addr")
        .await
        .unwrap();
    assert_eq!(result.rows[0], vec![Value::from("192.168.0.1")]);
    client.close().await.unwrap();
}
