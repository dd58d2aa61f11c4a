//! Shared fixtures for integration tests.

use db_export::config::ConnectionConfig;
use db_export::db::{self, DatabaseClient};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Creates a SQLite database file with `users` and `empty_table`, and connects to it.
pub async fn seeded_sqlite() -> (Box<dyn DatabaseClient>, TempDir) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("source.db");
    seed(&path).await;

    let config =
        ConnectionConfig::from_connection_string(&format!("sqlite:{}", path.display())).unwrap();
    (db::connect(&config).await.unwrap(), dir)
}

async fn seed(path: &Path) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true),
        )
        .await
        .unwrap();

    for statement in [
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, email TEXT, score REAL)",
        "INSERT INTO users VALUES \
            (1, 'Alice', 'alice@example.com', 9.5), \
            (2, 'Bob, Jr.', NULL, 7.25), \
            (3, 'Carol \"CJ\" Jones', 'carol@example.com', NULL)",
        "CREATE TABLE empty_table (id INTEGER, label TEXT)",
    ] {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool.close().await;
}
