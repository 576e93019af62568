//! Text table output for query results.
//!
//! Renders column headers verbatim and every cell via its display string,
//! with box-drawing borders and auto-sized columns. Cells are never
//! truncated so the table can be read back losslessly. Control characters
//! are written as escapes so one row is always one line.

use crate::db::QueryResult;

/// Minimum width for any column.
const MIN_COLUMN_WIDTH: usize = 4;

/// Printed instead of a table when a result has no rows.
pub const NO_RECORDS: &str = "No records found.";

/// Renders query results as boxed text tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableReporter;

impl TableReporter {
    pub fn new() -> Self {
        Self
    }

    /// Renders the result, or the "no records" notice for an empty result.
    pub fn render(&self, result: &QueryResult) -> String {
        if result.is_empty() {
            return NO_RECORDS.to_string();
        }

        let headers: Vec<String> = result.columns.iter().map(|c| escape_cell(&c.name)).collect();
        let headers: Vec<&str> = headers.iter().map(String::as_str).collect();
        let cells: Vec<Vec<String>> = result
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| escape_cell(&v.to_display_string()))
                    .collect()
            })
            .collect();

        let widths = column_widths(&headers, &cells);
        let mut lines = Vec::with_capacity(cells.len() + 5);

        lines.push(border(&widths, '┌', '┬', '┐'));
        lines.push(data_line(&headers, &widths));
        lines.push(border(&widths, '├', '┼', '┤'));
        for row in &cells {
            let row: Vec<&str> = row.iter().map(String::as_str).collect();
            lines.push(data_line(&row, &widths));
        }
        lines.push(border(&widths, '└', '┴', '┘'));

        let count = result.row_count();
        lines.push(format!(
            "{} row{} returned ({}ms)",
            count,
            if count == 1 { "" } else { "s" },
            result.execution_time.as_millis()
        ));

        lines.join("\n")
    }
}

/// Escapes control characters so every cell stays on one line.
fn escape_cell(text: &str) -> String {
    if !text.chars().any(char::is_control) {
        return text.to_string();
    }

    let mut escaped = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        match c {
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c.is_control() => escaped.extend(c.escape_unicode()),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Calculates the width of each column from its header and cells.
fn column_widths(headers: &[&str], cells: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|h| h.chars().count().max(MIN_COLUMN_WIDTH))
        .collect();

    for row in cells {
        for (i, value) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(value.chars().count());
            }
        }
    }

    widths
}

fn border(widths: &[usize], left: char, middle: char, right: char) -> String {
    let mut line = String::new();
    line.push(left);
    for (i, width) in widths.iter().enumerate() {
        line.push_str(&"─".repeat(width + 2));
        line.push(if i + 1 == widths.len() { right } else { middle });
    }
    line
}

fn data_line(values: &[&str], widths: &[usize]) -> String {
    let mut line = String::from("│");
    for (value, width) in values.iter().zip(widths) {
        let padding = width.saturating_sub(value.chars().count());
        line.push(' ');
        line.push_str(value);
        line.push_str(&" ".repeat(padding + 1));
        line.push('│');
    }
    line
}
