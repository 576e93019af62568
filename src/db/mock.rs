//! Mock database clients for testing.
//!
//! `MockDatabaseClient` returns scripted results keyed by exact SQL text and
//! records every statement it receives, so tests can assert execution order.

use super::{ColumnInfo, DatabaseBackend, DatabaseClient, QueryResult, Value, WeatherObservation};
use crate::error::{ReportError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Scripted outcome for one SQL string.
#[derive(Debug, Clone)]
enum MockResponse {
    Rows(QueryResult),
    Error(String),
}

/// A mock database client that returns predefined results.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    backend: DatabaseBackend,
    responses: HashMap<String, MockResponse>,
    statement_error: Option<String>,
    executed: Mutex<Vec<String>>,
    inserted: Mutex<Vec<WeatherObservation>>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretends to be the given backend.
    pub fn with_backend(mut self, backend: DatabaseBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Scripts the result returned for `sql`.
    pub fn with_result(mut self, sql: impl Into<String>, result: QueryResult) -> Self {
        self.responses.insert(sql.into(), MockResponse::Rows(result));
        self
    }

    /// Scripts a query error for `sql`.
    pub fn with_error(mut self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses
            .insert(sql.into(), MockResponse::Error(message.into()));
        self
    }

    /// Makes every `execute_statement` call fail with the given message.
    pub fn fail_statements(mut self, message: impl Into<String>) -> Self {
        self.statement_error = Some(message.into());
        self
    }

    /// Returns every SQL string received so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Returns every observation inserted so far.
    pub fn inserted(&self) -> Vec<WeatherObservation> {
        self.inserted.lock().map(|i| i.clone()).unwrap_or_default()
    }

    fn record(&self, sql: &str) {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.record(sql);

        match self.responses.get(sql) {
            Some(MockResponse::Rows(result)) => Ok(result.clone()),
            Some(MockResponse::Error(message)) => Err(ReportError::query(message.clone())),
            // Unscripted queries get a single-row echo
            None => Ok(QueryResult::with_data(
                vec![ColumnInfo::new("result", "TEXT")],
                vec![vec![Value::String(format!("Mock result for: {sql}"))]],
            )
            .with_execution_time(Duration::from_millis(1))),
        }
    }

    async fn execute_statement(&self, sql: &str) -> Result<u64> {
        self.record(sql);

        match &self.statement_error {
            Some(message) => Err(ReportError::query(message.clone())),
            None => Ok(0),
        }
    }

    async fn insert_observations(&self, observations: &[WeatherObservation]) -> Result<u64> {
        let mut inserted = self
            .inserted
            .lock()
            .map_err(|_| ReportError::internal("mock insert log poisoned"))?;
        inserted.extend_from_slice(observations);
        Ok(observations.len() as u64)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A database client whose every operation fails, as after a lost connection.
#[derive(Debug, Default)]
pub struct FailingDatabaseClient;

impl FailingDatabaseClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
    }

    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(ReportError::query("connection closed"))
    }

    async fn execute_statement(&self, _sql: &str) -> Result<u64> {
        Err(ReportError::query("connection closed"))
    }

    async fn insert_observations(&self, _observations: &[WeatherObservation]) -> Result<u64> {
        Err(ReportError::query("connection closed"))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
