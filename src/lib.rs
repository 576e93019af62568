//! weather-report - ingests weather observations and prints a fixed set of
//! SQL reports as text tables and time-series charts.
//!
//! This library exposes the core modules for use in integration tests.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod query;
pub mod report;
pub mod safety;
pub mod weather;
