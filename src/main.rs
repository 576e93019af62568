//! weather-report - stores the current weather and prints the report catalog.

use std::io;

use tracing::{error, info};
use weather_report::config::Config;
use weather_report::db;
use weather_report::error::Result;
use weather_report::logging::init_stderr_logging;
use weather_report::pipeline::run_report;
use weather_report::report::chart::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

#[tokio::main]
async fn main() {
    init_stderr_logging();

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env()?;

    info!("Connecting to {}", config.database.display_string());
    let db = db::connect(&config.database).await?;

    let summary = run_report(db.as_ref(), &config.weather, io::stdout().lock(), chart_size()).await;

    // Close even when output failed part-way.
    db.close().await?;
    summary.map(|_| ())
}

/// Sizes charts to the terminal width, falling back to the default.
fn chart_size() -> (u16, u16) {
    match crossterm::terminal::size() {
        Ok((columns, _)) if columns > 0 => (columns.min(DEFAULT_WIDTH * 2), DEFAULT_HEIGHT),
        _ => (DEFAULT_WIDTH, DEFAULT_HEIGHT),
    }
}
