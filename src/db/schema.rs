//! Weather table definition.
//!
//! One wide table holds every observation. Column names mirror the public
//! "weather history" dataset the report queries were written against, so
//! they contain spaces and units and must always be double-quoted.

use super::{DatabaseBackend, DatabaseClient};
use crate::error::{ReportError, Result};
use chrono::NaiveDateTime;
use tracing::{debug, info};

/// Name of the observations table.
pub const WEATHER_TABLE: &str = "weather_history";

pub const COL_FORMATTED_DATE: &str = "Formatted Date";
pub const COL_SUMMARY: &str = "Summary";
pub const COL_PRECIP_TYPE: &str = "Precip Type";
pub const COL_TEMPERATURE: &str = "Temperature (C)";
pub const COL_APPARENT_TEMPERATURE: &str = "Apparent Temperature (C)";
pub const COL_HUMIDITY: &str = "Humidity";
pub const COL_WIND_SPEED: &str = "Wind Speed (km/h)";
pub const COL_WIND_BEARING: &str = "Wind Bearing (degrees)";
pub const COL_VISIBILITY: &str = "Visibility (km)";
pub const COL_LOUD_COVER: &str = "Loud Cover";
pub const COL_PRESSURE: &str = "Pressure (millibars)";
pub const COL_DAILY_SUMMARY: &str = "Daily Summary";

/// Logical column type, mapped to a concrete SQL type per backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Timestamp,
    ShortText,
    LongText,
    Float,
}

impl ColumnKind {
    fn sql_type(self, backend: DatabaseBackend) -> &'static str {
        match (backend, self) {
            (DatabaseBackend::Postgres, Self::Timestamp) => "TIMESTAMP",
            (DatabaseBackend::Postgres, Self::ShortText) => "VARCHAR(255)",
            (DatabaseBackend::Postgres, Self::LongText) => "TEXT",
            (DatabaseBackend::Postgres, Self::Float) => "DOUBLE PRECISION",
            (DatabaseBackend::Sqlite, Self::Timestamp) => "DATETIME",
            (DatabaseBackend::Sqlite, Self::ShortText | Self::LongText) => "TEXT",
            (DatabaseBackend::Sqlite, Self::Float) => "REAL",
        }
    }
}

/// All table columns in declaration order.
const COLUMNS: [(&str, ColumnKind); 12] = [
    (COL_FORMATTED_DATE, ColumnKind::Timestamp),
    (COL_SUMMARY, ColumnKind::ShortText),
    (COL_PRECIP_TYPE, ColumnKind::ShortText),
    (COL_TEMPERATURE, ColumnKind::Float),
    (COL_APPARENT_TEMPERATURE, ColumnKind::Float),
    (COL_HUMIDITY, ColumnKind::Float),
    (COL_WIND_SPEED, ColumnKind::Float),
    (COL_WIND_BEARING, ColumnKind::Float),
    (COL_VISIBILITY, ColumnKind::Float),
    (COL_LOUD_COVER, ColumnKind::Float),
    (COL_PRESSURE, ColumnKind::Float),
    (COL_DAILY_SUMMARY, ColumnKind::LongText),
];

/// Returns the column names in declaration order.
pub fn column_names() -> impl Iterator<Item = &'static str> {
    COLUMNS.iter().map(|(name, _)| *name)
}

/// Returns the idempotent CREATE TABLE statement for the backend.
pub fn create_table_sql(backend: DatabaseBackend) -> String {
    let columns = COLUMNS
        .iter()
        .map(|(name, kind)| format!("    \"{name}\" {}", kind.sql_type(backend)))
        .collect::<Vec<_>>()
        .join(",\n");

    format!("CREATE TABLE IF NOT EXISTS {WEATHER_TABLE} (\n{columns}\n)")
}

/// Returns the parameterized INSERT statement for one observation.
pub fn insert_sql(backend: DatabaseBackend) -> String {
    let names = column_names()
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(", ");

    let placeholders = (1..=COLUMNS.len())
        .map(|i| match backend {
            DatabaseBackend::Postgres => format!("${i}"),
            DatabaseBackend::Sqlite => "?".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("INSERT INTO {WEATHER_TABLE} ({names}) VALUES ({placeholders})")
}

/// Creates the weather table if it does not already exist.
///
/// Failures are reported as [`ReportError::Schema`].
pub async fn ensure_schema(db: &dyn DatabaseClient) -> Result<()> {
    let ddl = create_table_sql(db.backend());
    debug!("Ensuring schema:\n{ddl}");

    db.execute_statement(&ddl)
        .await
        .map_err(|e| ReportError::schema(format!("Failed to create {WEATHER_TABLE}: {e}")))?;

    info!("Table {WEATHER_TABLE} is ready");
    Ok(())
}

/// One row of the weather table.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherObservation {
    pub formatted_date: NaiveDateTime,
    pub summary: Option<String>,
    pub precip_type: Option<String>,
    pub temperature_c: Option<f64>,
    pub apparent_temperature_c: Option<f64>,
    /// Relative humidity as a fraction in `0.0..=1.0`.
    pub humidity: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub wind_bearing_degrees: Option<f64>,
    pub visibility_km: Option<f64>,
    /// Cloud cover as a fraction in `0.0..=1.0`.
    pub loud_cover: Option<f64>,
    pub pressure_millibars: Option<f64>,
    pub daily_summary: Option<String>,
}
