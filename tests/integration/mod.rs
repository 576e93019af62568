//! Integration tests for weather-report.

pub mod ingest_test;
pub mod pipeline_test;
pub mod postgres_test;

use chrono::NaiveDate;
use weather_report::db::{ensure_schema, DatabaseClient, SqliteClient, WeatherObservation};

/// One hourly observation on 2006-04-01.
pub fn observation(hour: u32, temperature: f64) -> WeatherObservation {
    let precip = match hour % 3 {
        0 => Some("rain".to_string()),
        1 => Some("snow".to_string()),
        _ => None,
    };

    WeatherObservation {
        formatted_date: NaiveDate::from_ymd_opt(2006, 4, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap(),
        summary: Some("Partly Cloudy".to_string()),
        precip_type: precip,
        temperature_c: Some(temperature),
        apparent_temperature_c: Some(temperature - 1.0),
        humidity: Some(0.5 + f64::from(hour % 5) / 10.0),
        wind_speed_kmh: Some(14.1),
        wind_bearing_degrees: Some(251.0),
        visibility_km: Some(15.8),
        loud_cover: Some(0.0),
        pressure_millibars: Some(1015.13),
        daily_summary: Some("Partly cloudy throughout the day.".to_string()),
    }
}

/// An in-memory database holding 24 hourly rows, 5C rising to 28C.
pub async fn seeded_sqlite() -> SqliteClient {
    let client = SqliteClient::in_memory().await.unwrap();
    ensure_schema(&client).await.unwrap();

    let rows: Vec<_> = (0..24).map(|h| observation(h, 5.0 + f64::from(h))).collect();
    client.insert_observations(&rows).await.unwrap();
    client
}
