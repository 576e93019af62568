//! SQLite database client implementation.
//!
//! Lets the report run against a local file (or `:memory:`) without a
//! database server. The pool holds a single connection that never expires so
//! an in-memory database lives as long as the client.

use crate::config::ConnectionConfig;
use crate::db::schema::insert_sql;
use crate::db::{
    ColumnInfo, DatabaseBackend, DatabaseClient, QueryResult, Row, Value, WeatherObservation,
};
use crate::error::{ReportError, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::debug;

/// SQLite database client.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    /// Opens (creating if missing) the SQLite database named by the config.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;
        debug!("Opening {}", config.display_string());

        let options = SqliteConnectOptions::from_str(&conn_str)
            .map_err(|e| ReportError::connection(format!("Invalid database path: {e}")))?
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| ReportError::connection(format!("Failed to open database: {e}")))?;

        Ok(Self { pool })
    }

    /// Opens a fresh in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let config = ConnectionConfig {
            backend: DatabaseBackend::Sqlite,
            database: Some(":memory:".to_string()),
            ..Default::default()
        };
        Self::connect(&config).await
    }

    async fn describe_columns(&self, sql: &str) -> Vec<ColumnInfo> {
        match self.pool.describe(sql).await {
            Ok(describe) => describe
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            Err(e) => {
                debug!("Could not describe empty result: {e}");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let result = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ReportError::query(format_query_error(e)))?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = match result.first() {
            Some(first_row) => first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            None => self.describe_columns(sql).await,
        };

        let rows: Vec<Row> = result.iter().map(convert_row).collect();

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
        })
    }

    async fn execute_statement(&self, sql: &str) -> Result<u64> {
        let done = sqlx::query(sql)
            .execute(&self.pool)
            .await
            .map_err(|e| ReportError::query(format_query_error(e)))?;
        Ok(done.rows_affected())
    }

    async fn insert_observations(&self, observations: &[WeatherObservation]) -> Result<u64> {
        let sql = insert_sql(DatabaseBackend::Sqlite);
        let mut inserted = 0;

        for obs in observations {
            let done = sqlx::query(&sql)
                .bind(obs.formatted_date)
                .bind(obs.summary.as_deref())
                .bind(obs.precip_type.as_deref())
                .bind(obs.temperature_c)
                .bind(obs.apparent_temperature_c)
                .bind(obs.humidity)
                .bind(obs.wind_speed_kmh)
                .bind(obs.wind_bearing_degrees)
                .bind(obs.visibility_km)
                .bind(obs.loud_cover)
                .bind(obs.pressure_millibars)
                .bind(obs.daily_summary.as_deref())
                .execute(&self.pool)
                .await
                .map_err(|e| ReportError::query(format_query_error(e)))?;
            inserted += done.rows_affected();
        }

        Ok(inserted)
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts one cell, using the declared column type for temporal columns and
/// the stored value's own type otherwise (expression columns have no
/// declared type in SQLite).
fn convert_value(row: &SqliteRow, index: usize, declared: &str) -> Value {
    let storage = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    if matches!(
        declared.to_uppercase().as_str(),
        "DATETIME" | "TIMESTAMP" | "DATE"
    ) {
        if let Ok(ts) = row.try_get::<NaiveDateTime, _>(index) {
            return Value::Timestamp(ts);
        }
    }

    match storage.as_str() {
        "INTEGER" | "INT8" | "BIGINT" => row
            .try_get::<i64, _>(index)
            .map(Value::Int)
            .unwrap_or(Value::Null),
        "REAL" => row
            .try_get::<f64, _>(index)
            .map(Value::Float)
            .unwrap_or(Value::Null),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null),
        "BOOLEAN" => row
            .try_get::<bool, _>(index)
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<String, _>(index)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => format!("ERROR: {}", db_error.message()),
        None => error.to_string(),
    }
}
