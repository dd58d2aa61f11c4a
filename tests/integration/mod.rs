//! Integration tests for db-export.

pub mod app_test;
pub mod common;
pub mod export_test;
pub mod persistence_test;
pub mod postgres_test;
