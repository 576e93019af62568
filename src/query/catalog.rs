//! The fixed report catalog.
//!
//! Nine queries exercising projection, filtering, sorting, aggregation and
//! grouping against the weather table. Order is significant: entries run and
//! print in this order. The SQL sticks to the subset PostgreSQL and SQLite
//! share (`LIMIT`, double-quoted identifiers, aliased derived tables).

use crate::db::schema::{COL_FORMATTED_DATE, COL_TEMPERATURE};

/// Which result columns feed a time-series chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartMapping {
    /// Temporal column plotted on the X axis.
    pub x_column: &'static str,
    /// Numeric column plotted on the Y axis.
    pub y_column: &'static str,
}

impl ChartMapping {
    pub const fn new(x_column: &'static str, y_column: &'static str) -> Self {
        Self { x_column, y_column }
    }
}

/// Temperature over time, straight from the table.
pub const TEMPERATURE_SERIES: ChartMapping = ChartMapping::new(COL_FORMATTED_DATE, COL_TEMPERATURE);

/// One named catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDefinition {
    pub title: &'static str,
    pub sql: &'static str,
    /// Set for time-series queries; `None` means table output only.
    pub chart: Option<ChartMapping>,
}

impl QueryDefinition {
    pub const fn new(title: &'static str, sql: &'static str) -> Self {
        Self {
            title,
            sql,
            chart: None,
        }
    }

    /// Marks the entry as a time series plotted with `mapping`.
    pub const fn charted(self, mapping: ChartMapping) -> Self {
        Self {
            chart: Some(mapping),
            ..self
        }
    }

    /// Returns true if the entry's results are charted.
    pub fn is_time_series(&self) -> bool {
        self.chart.is_some()
    }
}

static CATALOG: [QueryDefinition; 9] = [
    QueryDefinition::new(
        "Selecting top 15 records",
        "SELECT * FROM weather_history LIMIT 15;",
    ),
    QueryDefinition::new(
        "Selecting specific columns for top 15 records",
        "SELECT \"Formatted Date\", \"Temperature (C)\" FROM weather_history LIMIT 15;",
    )
    .charted(TEMPERATURE_SERIES),
    QueryDefinition::new(
        "Selecting top 15 records for specific date range",
        "SELECT * FROM weather_history \
         WHERE \"Formatted Date\" BETWEEN '2006-04-01 00:00:00' AND '2006-04-01 23:00:00' \
         LIMIT 15;",
    ),
    QueryDefinition::new(
        "Selecting top 15 records filtered by precipitation type",
        "SELECT * FROM weather_history WHERE \"Precip Type\" = 'rain' LIMIT 15;",
    ),
    QueryDefinition::new(
        "Selecting top 15 records filtered by temperature range",
        "SELECT * FROM weather_history \
         WHERE \"Temperature (C)\" >= 15 AND \"Temperature (C)\" <= 20 \
         LIMIT 15;",
    )
    .charted(TEMPERATURE_SERIES),
    QueryDefinition::new(
        "Selecting top 15 records ordered by temperature (descending)",
        "SELECT * FROM weather_history ORDER BY \"Temperature (C)\" DESC LIMIT 15;",
    )
    .charted(TEMPERATURE_SERIES),
    // A single aggregate has no date column; the chart reports insufficient data.
    QueryDefinition::new(
        "Calculating average temperature for top 15 records",
        "SELECT AVG(\"Temperature (C)\") AS \"Average_Temperature\" \
         FROM (SELECT \"Temperature (C)\" FROM weather_history LIMIT 15) AS top15;",
    )
    .charted(ChartMapping::new(COL_FORMATTED_DATE, "Average_Temperature")),
    QueryDefinition::new(
        "Counting rows for top 15 records",
        "SELECT COUNT(*) AS \"Row_Count\" \
         FROM (SELECT * FROM weather_history LIMIT 15) AS top15;",
    ),
    QueryDefinition::new(
        "Grouping by precipitation type and calculating average humidity for top 15 records",
        "SELECT \"Precip Type\", AVG(\"Humidity\") AS \"Average_Humidity\" \
         FROM (SELECT \"Precip Type\", \"Humidity\" FROM weather_history LIMIT 15) AS top15 \
         GROUP BY \"Precip Type\";",
    ),
];

/// Returns the catalog in execution order.
pub fn definitions() -> &'static [QueryDefinition] {
    &CATALOG
}
