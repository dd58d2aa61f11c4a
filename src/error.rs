//! Error types for db-export.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for db-export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, missing tables, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Filesystem errors (output directory not creatable, write failures, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization errors raised by the CSV, XLSX or JSON writers.
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Invalid user selection (out-of-range index, non-numeric input, etc.)
    #[error("Invalid input: {0}")]
    Input(String),

    /// State database errors (preset storage, migrations).
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExportError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a filesystem error with the given message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Creates a serialization error with the given message.
    pub fn serialize(msg: impl Into<String>) -> Self {
        Self::Serialize(msg.into())
    }

    /// Creates an input error with the given message.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Creates a persistence error with the given message.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Io(_) => "I/O Error",
            Self::Serialize(_) => "Serialization Error",
            Self::Input(_) => "Input Error",
            Self::Persistence(_) => "Persistence Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true for errors that only affect a single query of an export batch.
    ///
    /// Database and serialization failures skip the offending query; filesystem
    /// failures abort the whole batch.
    pub fn skips_query(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Query(_) | Self::Serialize(_)
        )
    }
}

/// Result type alias using ExportError.
pub type Result<T> = std::result::Result<T, ExportError>;
