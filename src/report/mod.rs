//! Text reporters for query results.

pub mod chart;
pub mod table;

pub use chart::{ChartOutcome, ChartReporter};
pub use table::{TableReporter, NO_RECORDS};
