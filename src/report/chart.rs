//! Time-series line charts rendered as text.
//!
//! The chart is drawn with ratatui's `Chart` widget into an off-screen
//! buffer and emitted line by line, so it works on any terminal and can be
//! captured in tests.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{Axis, Block, Chart, Dataset, GraphType, Widget};

use crate::db::{QueryResult, Value};
use crate::query::ChartMapping;

pub const DEFAULT_WIDTH: u16 = 100;
pub const DEFAULT_HEIGHT: u16 = 30;

const MIN_WIDTH: u16 = 40;
const MIN_HEIGHT: u16 = 12;

const X_AXIS_TITLE: &str = "Date";
const Y_AXIS_TITLE: &str = "Temperature (C)";
const X_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Accepted textual timestamp layouts, tried in order.
const TIMESTAMP_LAYOUTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Result of attempting to chart a query result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartOutcome {
    /// The rendered chart text.
    Rendered(String),
    /// The result had no rows.
    NoData,
    /// Rows exist but no (time, number) pair could be extracted.
    InsufficientData,
}

impl ChartOutcome {
    /// The line printed in place of a chart, if any.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            ChartOutcome::Rendered(_) => None,
            ChartOutcome::NoData => Some("No data fetched from the database."),
            ChartOutcome::InsufficientData => Some("Insufficient data for plotting."),
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, ChartOutcome::Rendered(_))
    }
}

/// Renders temperature-over-time charts for time-series results.
#[derive(Debug, Clone, Copy)]
pub struct ChartReporter {
    width: u16,
    height: u16,
}

impl Default for ChartReporter {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl ChartReporter {
    /// Creates a reporter drawing into a `width` x `height` cell area.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width: width.max(MIN_WIDTH),
            height: height.max(MIN_HEIGHT),
        }
    }

    /// Charts `result` using the columns named by `mapping`.
    ///
    /// Rows whose X value is not a timestamp or whose Y value is not numeric
    /// are skipped. Points are plotted in ascending time order.
    pub fn render(&self, result: &QueryResult, title: &str, mapping: &ChartMapping) -> ChartOutcome {
        if result.is_empty() {
            return ChartOutcome::NoData;
        }

        let points = series(result, mapping);
        if points.is_empty() {
            return ChartOutcome::InsufficientData;
        }

        ChartOutcome::Rendered(self.draw(&points, title))
    }

    fn draw(&self, points: &[(NaiveDateTime, f64)], title: &str) -> String {
        let data: Vec<(f64, f64)> = points
            .iter()
            .map(|(t, y)| (t.and_utc().timestamp() as f64, *y))
            .collect();

        let (x_min, x_max) = padded_bounds(data.iter().map(|p| p.0), 1800.0);
        let (y_min, y_max) = padded_bounds(data.iter().map(|p| p.1), 1.0);

        let x_ticks = [x_min, (x_min + x_max) / 2.0, x_max];
        let y_ticks = [y_min, (y_min + y_max) / 2.0, y_max];

        let grid: Vec<Vec<(f64, f64)>> = x_ticks
            .iter()
            .map(|&x| vec![(x, y_min), (x, y_max)])
            .chain(y_ticks.iter().map(|&y| vec![(x_min, y), (x_max, y)]))
            .collect();

        let grid_style = Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM);
        let mut datasets: Vec<Dataset> = grid
            .iter()
            .map(|line| {
                Dataset::default()
                    .marker(Marker::Dot)
                    .graph_type(GraphType::Line)
                    .style(grid_style)
                    .data(line)
            })
            .collect();

        datasets.push(
            Dataset::default()
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Cyan))
                .data(&data),
        );
        datasets.push(
            Dataset::default()
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(Color::Yellow))
                .data(&data),
        );

        let x_labels: Vec<String> = x_ticks.iter().map(|&x| format_time_tick(x)).collect();
        let y_labels: Vec<String> = y_ticks.iter().map(|y| format!("{y:.1}")).collect();

        let chart = Chart::new(datasets)
            .block(Block::bordered().title(title.to_string()))
            .x_axis(
                Axis::default()
                    .title(X_AXIS_TITLE)
                    .bounds([x_min, x_max])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .title(Y_AXIS_TITLE)
                    .bounds([y_min, y_max])
                    .labels(y_labels),
            );

        let area = Rect::new(0, 0, self.width, self.height);
        let mut buf = Buffer::empty(area);
        chart.render(area, &mut buf);
        buffer_to_text(&buf)
    }
}

/// Extracts (time, value) pairs, sorted by time.
pub fn series(result: &QueryResult, mapping: &ChartMapping) -> Vec<(NaiveDateTime, f64)> {
    let (Some(x), Some(y)) = (
        result.column_index(mapping.x_column),
        result.column_index(mapping.y_column),
    ) else {
        return Vec::new();
    };

    let mut points: Vec<(NaiveDateTime, f64)> = result
        .rows
        .iter()
        .filter_map(|row| {
            let time = row.get(x).and_then(as_timestamp)?;
            let value = row.get(y).and_then(Value::as_f64)?;
            value.is_finite().then_some((time, value))
        })
        .collect();

    points.sort_by_key(|(time, _)| *time);
    points
}

fn as_timestamp(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Timestamp(ts) => Some(*ts),
        Value::String(s) => parse_timestamp(s),
        _ => None,
    }
}

/// Parses the timestamp text layouts databases commonly return.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    TIMESTAMP_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Returns (min, max), widened by `pad` on each side when they coincide.
fn padded_bounds(values: impl Iterator<Item = f64>, pad: f64) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min < max {
        (min, max)
    } else {
        (min - pad, max + pad)
    }
}

fn format_time_tick(seconds: f64) -> String {
    DateTime::from_timestamp(seconds.round() as i64, 0)
        .map(|dt| dt.naive_utc().format(X_LABEL_FORMAT).to_string())
        .unwrap_or_default()
}

/// Flattens a buffer into text, one line per row, trailing spaces removed.
fn buffer_to_text(buf: &Buffer) -> String {
    let width = usize::from(buf.area.width.max(1));
    buf.content
        .chunks(width)
        .map(|row| {
            let line: String = row.iter().map(|cell| cell.symbol()).collect();
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
