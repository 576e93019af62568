//! Error types for the weather report.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for weather report operations.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Schema setup errors (DDL rejected, insufficient privileges, etc.)
    #[error("Schema error: {0}")]
    Schema(String),

    /// Query execution errors (syntax errors, missing tables, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Upstream weather API errors (non-success status, bad payload, etc.)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Configuration errors (missing environment variables, invalid values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure writing report output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReportError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a schema error with the given message.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a fetch error with the given message.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
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
            Self::Schema(_) => "Schema Error",
            Self::Query(_) => "Query Error",
            Self::Fetch(_) => "Fetch Error",
            Self::Config(_) => "Configuration Error",
            Self::Io(_) => "I/O Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true if this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Config(_) | Self::Io(_))
    }
}

/// Result type alias using ReportError.
pub type Result<T> = std::result::Result<T, ReportError>;
