//! The report pipeline.
//!
//! Runs each catalog entry in order, writing its header, table and optional
//! chart to the output sink before the next entry starts. A failing entry is
//! reported and skipped; only output errors stop the run.

use std::io::Write;

use tracing::{info, warn};

use crate::config::WeatherConfig;
use crate::db::{ensure_schema, DatabaseClient};
use crate::error::Result;
use crate::query::{definitions, QueryDefinition, QueryExecutor};
use crate::report::{ChartOutcome, ChartReporter, TableReporter, NO_RECORDS};
use crate::weather::{ingest_current, WeatherClient};

const SEPARATOR_WIDTH: usize = 50;

/// What happened to one catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    /// Rows were printed, with the chart outcome for time-series entries.
    Reported {
        rows: usize,
        chart: Option<ChartOutcome>,
    },
    /// The query succeeded with zero rows.
    Empty,
    /// The query failed; the message was printed.
    Failed { message: String },
}

/// Per-entry outcomes of a run, in catalog order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub entries: Vec<(&'static str, EntryOutcome)>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, o)| matches!(o, EntryOutcome::Failed { .. }))
            .count()
    }

    pub fn charts_rendered(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, o)| {
                matches!(
                    o,
                    EntryOutcome::Reported {
                        chart: Some(ChartOutcome::Rendered(_)),
                        ..
                    }
                )
            })
            .count()
    }
}

/// Drives the catalog against a database and writes the report.
pub struct ReportPipeline<'a, W: Write> {
    executor: QueryExecutor<'a>,
    out: W,
    table: TableReporter,
    chart: ChartReporter,
}

impl<'a, W: Write> ReportPipeline<'a, W> {
    pub fn new(db: &'a dyn DatabaseClient, out: W) -> Self {
        Self {
            executor: QueryExecutor::new(db),
            out,
            table: TableReporter::new(),
            chart: ChartReporter::default(),
        }
    }

    /// Sets the chart size in terminal cells.
    pub fn with_chart_size(mut self, width: u16, height: u16) -> Self {
        self.chart = ChartReporter::new(width, height);
        self
    }

    /// Returns the output sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Runs every definition in order.
    pub async fn run(&mut self, catalog: &[QueryDefinition]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for definition in catalog {
            let outcome = self.run_entry(definition).await?;
            summary.entries.push((definition.title, outcome));
        }

        info!(
            entries = summary.entries.len(),
            failed = summary.failed(),
            charts = summary.charts_rendered(),
            "Report complete"
        );
        Ok(summary)
    }

    async fn run_entry(&mut self, definition: &QueryDefinition) -> Result<EntryOutcome> {
        writeln!(self.out, "Query: {}", definition.title)?;
        writeln!(self.out, "SQL: {}", definition.sql)?;

        let outcome = match self.executor.execute(definition).await {
            Err(e) => {
                warn!(title = definition.title, error = %e, "Query failed");
                let message = e.to_string();
                writeln!(self.out, "Error executing query: {message}")?;
                EntryOutcome::Failed { message }
            }
            Ok(executed) if executed.result.is_empty() => {
                writeln!(self.out, "{NO_RECORDS}")?;
                EntryOutcome::Empty
            }
            Ok(executed) => {
                writeln!(self.out, "{}", self.table.render(&executed.result))?;

                let chart = definition.chart.map(|mapping| {
                    self.chart
                        .render(&executed.result, definition.title, &mapping)
                });
                match &chart {
                    Some(ChartOutcome::Rendered(text)) => writeln!(self.out, "{text}")?,
                    Some(other) => {
                        if let Some(notice) = other.notice() {
                            writeln!(self.out, "{notice}")?;
                        }
                    }
                    None => {}
                }

                EntryOutcome::Reported {
                    rows: executed.result.row_count(),
                    chart,
                }
            }
        };

        writeln!(self.out, "{}", "-".repeat(SEPARATOR_WIDTH))?;
        self.out.flush()?;
        Ok(outcome)
    }
}

/// Runs everything after the connection is open.
///
/// Schema setup and ingestion are reported to `out` when they fail, and the
/// catalog runs regardless. Only output errors are returned.
pub async fn run_report<W: Write>(
    db: &dyn DatabaseClient,
    weather: &WeatherConfig,
    mut out: W,
    (chart_width, chart_height): (u16, u16),
) -> Result<RunSummary> {
    match ensure_schema(db).await {
        Ok(()) => writeln!(out, "Table created successfully.")?,
        Err(e) => {
            warn!("Schema setup failed: {e}");
            writeln!(out, "Error creating schema: {e}")?;
        }
    }

    if let Err(e) = ingest(db, weather).await {
        warn!("Ingestion skipped: {e}");
        writeln!(out, "Failed to fetch weather data: {e}")?;
    }
    out.flush()?;

    let mut pipeline = ReportPipeline::new(db, out).with_chart_size(chart_width, chart_height);
    let summary = pipeline.run(definitions()).await?;
    Ok(summary)
}

async fn ingest(db: &dyn DatabaseClient, weather: &WeatherConfig) -> Result<u64> {
    let client = WeatherClient::new(weather)?;
    ingest_current(db, &client, &weather.city).await
}
