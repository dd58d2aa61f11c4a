//! db-export - export query results from PostgreSQL or SQLite to CSV, XLSX or JSON.
//!
//! This library exposes the core modules for the binary and integration tests.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod logging;
pub mod persistence;
pub mod prompt;
