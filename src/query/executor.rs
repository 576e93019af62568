//! Query execution with a read-only guard.
//!
//! Provides isolated execution of one catalog entry that can be tested
//! independently of the pipeline.

use std::time::Instant;

use tracing::debug;

use crate::db::{DatabaseClient, QueryResult};
use crate::error::{ReportError, Result};
use crate::query::QueryDefinition;
use crate::safety::SqlClassifier;

/// Runs catalog entries against an injected database client.
pub struct QueryExecutor<'a> {
    db: &'a dyn DatabaseClient,
    classifier: SqlClassifier,
}

/// Successful execution of one catalog entry.
#[derive(Debug)]
pub struct QueryOutcome {
    /// The entry that was executed.
    pub definition: QueryDefinition,
    /// Column metadata and rows, shape-checked.
    pub result: QueryResult,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(db: &'a dyn DatabaseClient) -> Self {
        Self {
            db,
            classifier: SqlClassifier::new(),
        }
    }

    /// Executes one definition.
    ///
    /// Statements that could modify data are refused without reaching the
    /// database. Errors carry the SQL text. Rows come back in the engine's
    /// order, and every row is guaranteed to match the column count.
    pub async fn execute(&self, definition: &QueryDefinition) -> Result<QueryOutcome> {
        let sql = definition.sql;

        let classification = self.classifier.classify(sql);
        if !classification.is_read_only() {
            let reason = classification
                .note
                .unwrap_or_else(|| format!("{} statements are not allowed", classification.kind));
            return Err(ReportError::query(format!(
                "Refusing non-read-only query ({reason}): {sql}"
            )));
        }

        let start = Instant::now();
        let result = self
            .db
            .execute_query(sql)
            .await
            .map_err(|e| ReportError::query(format!("{} [SQL: {sql}]", strip_prefix(&e))))?;

        result
            .validate_shape()
            .map_err(|e| ReportError::query(format!("{} [SQL: {sql}]", strip_prefix(&e))))?;

        debug!(
            title = definition.title,
            rows = result.row_count(),
            columns = result.columns.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query executed"
        );

        Ok(QueryOutcome {
            definition: *definition,
            result,
        })
    }
}

/// Returns the error message without the category prefix added by Display.
fn strip_prefix(error: &ReportError) -> String {
    match error {
        ReportError::Query(msg) | ReportError::Connection(msg) => msg.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ColumnInfo, FailingDatabaseClient, MockDatabaseClient, Value};

    const SELECT: QueryDefinition =
        QueryDefinition::new("Selecting top 15 records", "SELECT * FROM weather_history");

    #[tokio::test]
    async fn test_execute_read_query() {
        let mock_db = MockDatabaseClient::new();
        let executor = QueryExecutor::new(&mock_db);

        let outcome = executor.execute(&SELECT).await.unwrap();

        assert_eq!(outcome.definition, SELECT);
        assert_eq!(outcome.result.row_count(), 1);
        assert_eq!(mock_db.executed(), vec![SELECT.sql]);
    }

    #[tokio::test]
    async fn test_mutating_query_is_refused_before_execution() {
        let mock_db = MockDatabaseClient::new();
        let executor = QueryExecutor::new(&mock_db);
        let def = QueryDefinition::new("Purge", "DELETE FROM weather_history");

        let err = executor.execute(&def).await.unwrap_err();

        assert!(matches!(err, ReportError::Query(_)));
        assert!(err.to_string().contains("DELETE FROM weather_history"));
        assert!(mock_db.executed().is_empty());
    }

    #[tokio::test]
    async fn test_database_error_includes_sql() {
        let mock_db = MockDatabaseClient::new().with_error(SELECT.sql, "no such table");
        let executor = QueryExecutor::new(&mock_db);

        let err = executor.execute(&SELECT).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Query error: no such table [SQL: SELECT * FROM weather_history]"
        );
    }

    #[tokio::test]
    async fn test_ragged_result_is_an_error() {
        let ragged = QueryResult::with_data(
            vec![ColumnInfo::new("a", "INT8"), ColumnInfo::new("b", "INT8")],
            vec![vec![Value::Int(1)]],
        );
        let mock_db = MockDatabaseClient::new().with_result(SELECT.sql, ragged);
        let executor = QueryExecutor::new(&mock_db);

        let err = executor.execute(&SELECT).await.unwrap_err();
        assert!(err.to_string().contains("Malformed result"), "{err}");
    }

    #[tokio::test]
    async fn test_empty_result_is_success() {
        let empty = QueryResult::with_data(vec![ColumnInfo::new("a", "INT8")], vec![]);
        let mock_db = MockDatabaseClient::new().with_result(SELECT.sql, empty);
        let executor = QueryExecutor::new(&mock_db);

        let outcome = executor.execute(&SELECT).await.unwrap();
        assert!(outcome.result.is_empty());
    }

    #[tokio::test]
    async fn test_lost_connection_is_query_error() {
        let db = FailingDatabaseClient::new();
        let executor = QueryExecutor::new(&db);

        let err = executor.execute(&SELECT).await.unwrap_err();
        assert!(matches!(err, ReportError::Query(_)));
    }
}
