//! Weather ingestion.
//!
//! Fetches the current observation for the configured city and stores it as
//! one row of the weather table before reports run.

mod client;
mod observation;

pub use client::WeatherClient;
pub use observation::{Clouds, Condition, CurrentWeather, MainReadings, Wind};

pub use crate::db::WeatherObservation;

use tracing::info;

use crate::db::DatabaseClient;
use crate::error::Result;

/// Fetches the current observation for `city` and inserts it.
///
/// Returns the number of rows inserted. Callers treat failure as non-fatal.
pub async fn ingest_current(
    db: &dyn DatabaseClient,
    client: &WeatherClient,
    city: &str,
) -> Result<u64> {
    let payload = client.fetch_current(city).await?;
    let observation = WeatherObservation::from_payload(&payload)?;

    let inserted = db.insert_observations(&[observation]).await?;
    info!(city, inserted, "Stored current observation");
    Ok(inserted)
}
