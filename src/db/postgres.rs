//! PostgreSQL database client implementation.
//!
//! The production backend. One pooled connection is opened per run and
//! shared by schema setup, ingestion and every report query.

use crate::config::ConnectionConfig;
use crate::db::schema::insert_sql;
use crate::db::{
    ColumnInfo, DatabaseBackend, DatabaseClient, QueryResult, Row, Value, WeatherObservation,
};
use crate::error::{ReportError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow, Postgres};
use sqlx::types::Decimal;
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, TypeInfo};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long to wait for the single connection attempt.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL database client.
#[derive(Debug)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Connects to PostgreSQL. Exactly one attempt is made.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;
        debug!("Connecting to {}", config.display_string());

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Successfully connected to database");
        Ok(Self { pool })
    }

    /// Creates a new PostgresClient from an existing connection pool.
    ///
    /// This is primarily useful for testing.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches column metadata for a statement without rows to read it from.
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
impl DatabaseClient for PostgresClient {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
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
        let sql = insert_sql(DatabaseBackend::Postgres);
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

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Reads a nullable cell as `T`. Decode failures are logged and shown as NULL.
fn cell<'r, T>(row: &'r PgRow, index: usize) -> Option<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    match row.try_get::<Option<T>, _>(index) {
        Ok(value) => value,
        Err(e) => {
            warn!(column = index, error = %e, "Could not decode value; showing NULL");
            None
        }
    }
}

/// NUMERIC values are reported as floats; out-of-range ones keep their text.
fn decimal_to_value(decimal: Decimal) -> Value {
    f64::try_from(decimal)
        .map(Value::Float)
        .unwrap_or_else(|_| Value::String(decimal.to_string()))
}

/// Converts a single column value from a PgRow to our Value type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    let value = match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => cell::<bool>(row, index).map(Value::Bool),
        "INT2" | "SMALLINT" => cell::<i16>(row, index).map(|v| Value::Int(v.into())),
        "INT4" | "INT" | "INTEGER" => cell::<i32>(row, index).map(|v| Value::Int(v.into())),
        "INT8" | "BIGINT" => cell::<i64>(row, index).map(Value::Int),
        "FLOAT4" | "REAL" => cell::<f32>(row, index).map(|v| Value::Float(v.into())),
        "FLOAT8" | "DOUBLE PRECISION" => cell::<f64>(row, index).map(Value::Float),
        "NUMERIC" | "DECIMAL" => cell::<Decimal>(row, index).map(decimal_to_value),
        "TIMESTAMP" => cell::<NaiveDateTime>(row, index).map(Value::Timestamp),
        "TIMESTAMPTZ" => {
            cell::<DateTime<Utc>>(row, index).map(|v| Value::Timestamp(v.naive_utc()))
        }
        "DATE" => cell::<NaiveDate>(row, index)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(Value::Timestamp),
        "BYTEA" => cell::<Vec<u8>>(row, index).map(Value::Bytes),
        // Text and anything without a dedicated mapping
        _ => cell::<String>(row, index).map(Value::String),
    };

    value.unwrap_or(Value::Null)
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> ReportError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.port;
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        ReportError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        ReportError::connection(format!(
            "Authentication failed for user '{user}'. Check DB_USERNAME and DB_PASSWORD."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        ReportError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        ReportError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        ReportError::connection(error.to_string())
    }
}

/// Formats a query error with PostgreSQL detail and hint when available.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = format!("ERROR: {}", db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }
        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }
    }

    result
}
