//! Integration tests for the preset store.

use db_export::error::ExportError;
use db_export::persistence::{presets, PresetQuery, StateDb};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

async fn create_test_db() -> (StateDb, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test_state.db");
    let db = StateDb::open(&path).await.unwrap();
    (db, dir)
}

#[tokio::test]
async fn test_state_db_creation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config").join("state.db");

    let db = StateDb::open(&path).await.unwrap();
    assert!(path.exists());
    db.close().await;
}

#[tokio::test]
async fn test_preset_crud() {
    let (db, _dir) = create_test_db().await;

    presets::save_query_to_db(db.pool(), "users", "SELECT * FROM users")
        .await
        .unwrap();
    presets::save_query_to_db(db.pool(), "orders", "SELECT * FROM orders")
        .await
        .unwrap();

    presets::update_query_in_database(db.pool(), "orders", "SELECT id FROM orders")
        .await
        .unwrap();

    assert_eq!(
        presets::retrieve_preset_queries(db.pool()).await.unwrap(),
        vec![
            PresetQuery::new("users", "SELECT * FROM users"),
            PresetQuery::new("orders", "SELECT id FROM orders"),
        ]
    );

    presets::delete_preset(db.pool(), "users").await.unwrap();
    assert_eq!(
        presets::retrieve_preset_queries(db.pool()).await.unwrap(),
        vec![PresetQuery::new("orders", "SELECT id FROM orders")]
    );
}

#[tokio::test]
async fn test_update_applies_to_every_preset_with_the_name() {
    let (db, _dir) = create_test_db().await;
    presets::save_query_to_db(db.pool(), "users", "SELECT 1")
        .await
        .unwrap();
    presets::save_query_to_db(db.pool(), "users", "SELECT 2")
        .await
        .unwrap();

    let updated = presets::update_query_in_database(db.pool(), "users", "SELECT 3")
        .await
        .unwrap();

    assert_eq!(updated, 2);
    let stored = presets::retrieve_preset_queries(db.pool()).await.unwrap();
    assert!(stored.iter().all(|p| p.sql == "SELECT 3"));
}

#[tokio::test]
async fn test_update_unknown_preset() {
    let (db, _dir) = create_test_db().await;
    let error = presets::update_query_in_database(db.pool(), "ghost", "SELECT 1")
        .await
        .unwrap_err();
    assert!(matches!(error, ExportError::Persistence(_)));
}

#[tokio::test]
async fn test_presets_persist_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.db");

    let db = StateDb::open(&path).await.unwrap();
    presets::save_query_to_db(db.pool(), "users", "SELECT * FROM users")
        .await
        .unwrap();
    db.close().await;

    let db = StateDb::open(&path).await.unwrap();
    let stored = presets::retrieve_preset_queries(db.pool()).await.unwrap();
    assert_eq!(stored.len(), 1);
    db.close().await;
}
