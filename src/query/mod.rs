//! Query catalog and execution.
//!
//! This module isolates the fixed report queries and their execution from
//! the reporters that format the results.

pub mod catalog;
pub mod executor;

pub use catalog::{definitions, ChartMapping, QueryDefinition, TEMPERATURE_SERIES};
pub use executor::{QueryExecutor, QueryOutcome};
