//! Database abstraction layer for the weather report.
//!
//! Provides a trait-based interface for database operations, allowing
//! different database backends to be used interchangeably. The client is
//! opened once per process and passed by reference to every operation.

mod mock;
mod postgres;
pub mod schema;
mod sqlite;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use schema::{ensure_schema, WeatherObservation, WEATHER_TABLE};
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the backend as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Returns the default port for this backend (0 when not network-based).
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres => 5432,
            Self::Sqlite => 0,
        }
    }
}

/// Creates a database client for the given backend and configuration.
///
/// This is the central factory function for database connections. A failure
/// here is fatal to the run.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    match config.backend {
        DatabaseBackend::Postgres => {
            let client = PostgresClient::connect(config).await?;
            Ok(Box::new(client))
        }
        DatabaseBackend::Sqlite => {
            let client = SqliteClient::connect(config).await?;
            Ok(Box::new(client))
        }
    }
}

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with ReportError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Returns the backend this client talks to.
    fn backend(&self) -> DatabaseBackend;

    /// Executes a read query and returns column metadata plus rows.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Executes a statement that returns no rows (DDL), returning rows affected.
    async fn execute_statement(&self, sql: &str) -> Result<u64>;

    /// Inserts observations into the weather table, returning rows inserted.
    async fn insert_observations(&self, observations: &[WeatherObservation]) -> Result<u64>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
