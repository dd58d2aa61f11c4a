//! End-to-end export tests against a SQLite source database.

use super::common::seeded_sqlite;
use db_export::error::ExportError;
use db_export::export::{ExportEngine, ExportFormat};
use db_export::persistence::PresetQuery;
use pretty_assertions::assert_eq;
use std::io::{Cursor, Read};
use tempfile::tempdir;

const USERS: &str = "SELECT id, name, email, score FROM users ORDER BY id";

fn sheet_xml(path: &std::path::Path) -> String {
    let bytes = std::fs::read(path).unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut sheet = archive.by_name("xl/worksheets/sheet1.xml").unwrap();
    let mut xml = String::new();
    sheet.read_to_string(&mut xml).unwrap();
    xml
}

#[tokio::test]
async fn test_csv_export_round_trips_through_a_csv_reader() {
    let (db, _source) = seeded_sqlite().await;
    let out = tempdir().unwrap();

    let outcome = ExportEngine::new(db.as_ref())
        .export_table_data("users", USERS, ExportFormat::Csv, out.path())
        .await
        .unwrap();

    assert_eq!(outcome.path, out.path().join("users.csv"));
    assert_eq!(outcome.row_count, 3);

    let mut reader = csv::Reader::from_path(&outcome.path).unwrap();
    assert_eq!(
        reader.headers().unwrap().iter().collect::<Vec<_>>(),
        vec!["id", "name", "email", "score"]
    );
    let records: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    assert_eq!(
        records,
        vec![
            vec!["1", "Alice", "alice@example.com", "9.5"],
            vec!["2", "Bob, Jr.", "", "7.25"],
            vec!["3", "Carol \"CJ\" Jones", "carol@example.com", ""],
        ]
    );
    db.close().await.unwrap();
}

#[tokio::test]
async fn test_json_export_preserves_values_and_nulls() {
    let (db, _source) = seeded_sqlite().await;
    let out = tempdir().unwrap();

    let outcome = ExportEngine::new(db.as_ref())
        .export_table_data("users", USERS, ExportFormat::Json, out.path())
        .await
        .unwrap();

    let text = std::fs::read_to_string(&outcome.path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!([
            {"id": 1, "name": "Alice", "email": "alice@example.com", "score": 9.5},
            {"id": 2, "name": "Bob, Jr.", "email": null, "score": 7.25},
            {"id": 3, "name": "Carol \"CJ\" Jones", "email": "carol@example.com", "score": null},
        ])
    );
}

#[tokio::test]
async fn test_xlsx_export_has_header_and_one_row_per_record() {
    let (db, _source) = seeded_sqlite().await;
    let out = tempdir().unwrap();

    let outcome = ExportEngine::new(db.as_ref())
        .export_table_data("users", USERS, ExportFormat::Xlsx, out.path())
        .await
        .unwrap();

    assert_eq!(outcome.path, out.path().join("users.xlsx"));
    let xml = sheet_xml(&outcome.path);
    assert_eq!(xml.matches("<row ").count(), 4);
}

#[tokio::test]
async fn test_empty_table_exports_header_only() {
    let (db, _source) = seeded_sqlite().await;
    let out = tempdir().unwrap();
    let engine = ExportEngine::new(db.as_ref());
    let query = "SELECT * FROM empty_table";

    let csv_out = engine
        .export_table_data("empty_table", query, ExportFormat::Csv, out.path())
        .await
        .unwrap();
    assert_eq!(
        std::fs::read_to_string(csv_out.path).unwrap(),
        "id,label\n"
    );

    let json_out = engine
        .export_table_data("empty_table", query, ExportFormat::Json, out.path())
        .await
        .unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json_out.path).unwrap()).unwrap();
    assert_eq!(parsed, serde_json::json!([]));

    let xlsx_out = engine
        .export_table_data("empty_table", query, ExportFormat::Xlsx, out.path())
        .await
        .unwrap();
    assert_eq!(sheet_xml(&xlsx_out.path).matches("<row ").count(), 1);
}

#[tokio::test]
async fn test_missing_output_directory_is_created() {
    let (db, _source) = seeded_sqlite().await;
    let out = tempdir().unwrap();
    let target = out.path().join("reports").join("2024");

    let outcome = ExportEngine::new(db.as_ref())
        .export_table_data("users", USERS, ExportFormat::Csv, &target)
        .await
        .unwrap();

    assert!(target.is_dir());
    assert!(outcome.path.starts_with(&target));
}

#[tokio::test]
async fn test_batch_continues_after_bad_query() {
    let (db, _source) = seeded_sqlite().await;
    let out = tempdir().unwrap();
    let queries = vec![
        PresetQuery::new("missing", "SELECT * FROM no_such_table"),
        PresetQuery::new("users", USERS),
    ];

    let report = ExportEngine::new(db.as_ref())
        .export_batch(&queries, ExportFormat::Json, out.path())
        .await
        .unwrap();

    assert_eq!(report.exported.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(report.failed[0].1, ExportError::Query(_)));
    assert!(out.path().join("users.json").exists());
    assert!(!out.path().join("missing.json").exists());
}

#[tokio::test]
async fn test_json_export_keeps_columns_with_the_same_name() {
    let (db, _source) = seeded_sqlite().await;
    let out = tempdir().unwrap();

    let outcome = ExportEngine::new(db.as_ref())
        .export_table_data(
            "dupes",
            "SELECT 1 AS id, 2 AS id, 'x' AS name",
            ExportFormat::Json,
            out.path(),
        )
        .await
        .unwrap();

    let parsed: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&outcome.path).unwrap()).unwrap();
    let record = parsed[0].as_object().unwrap();
    assert_eq!(record.len(), outcome.column_count);
    assert_eq!(
        parsed,
        serde_json::json!([{"id": 1, "id_2": 2, "name": "x"}])
    );
}
