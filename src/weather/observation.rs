//! OpenWeatherMap current-weather payload and its mapping to table rows.

use chrono::DateTime;
use serde::Deserialize;

use crate::db::WeatherObservation;
use crate::error::{ReportError, Result};

const MS_TO_KMH: f64 = 3.6;

/// Current-weather response body. Only the fields the table stores are read.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeather {
    /// Observation time, unix seconds UTC.
    pub dt: i64,
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub main: MainReadings,
    #[serde(default)]
    pub wind: Option<Wind>,
    /// Metres.
    #[serde(default)]
    pub visibility: Option<f64>,
    #[serde(default)]
    pub clouds: Option<Clouds>,
    #[serde(default)]
    pub rain: Option<serde_json::Value>,
    #[serde(default)]
    pub snow: Option<serde_json::Value>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    pub main: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Readings in metric units.
#[derive(Debug, Clone, Deserialize)]
pub struct MainReadings {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    /// hPa.
    pub pressure: Option<f64>,
    /// Percent.
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Wind {
    /// Metres per second.
    pub speed: Option<f64>,
    pub deg: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Clouds {
    /// Percent.
    pub all: Option<f64>,
}

impl CurrentWeather {
    /// Parses a JSON response body.
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| ReportError::fetch(format!("Malformed weather payload: {e}")))
    }

    fn precip_type(&self) -> Option<String> {
        if self.snow.is_some() {
            Some("snow".to_string())
        } else if self.rain.is_some() {
            Some("rain".to_string())
        } else {
            None
        }
    }
}

impl WeatherObservation {
    /// Converts a payload into a table row, normalising units.
    pub fn from_payload(payload: &CurrentWeather) -> Result<Self> {
        let formatted_date = DateTime::from_timestamp(payload.dt, 0)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| {
                ReportError::fetch(format!("Invalid observation time: {}", payload.dt))
            })?;

        let condition = payload.weather.first();
        let wind = payload.wind.as_ref();

        Ok(Self {
            formatted_date,
            summary: condition.map(|c| c.main.clone()),
            precip_type: payload.precip_type(),
            temperature_c: payload.main.temp,
            apparent_temperature_c: payload.main.feels_like,
            humidity: payload.main.humidity.map(percent_to_fraction),
            wind_speed_kmh: wind.and_then(|w| w.speed).map(|s| s * MS_TO_KMH),
            wind_bearing_degrees: wind.and_then(|w| w.deg),
            visibility_km: payload.visibility.map(|m| m / 1000.0),
            loud_cover: payload
                .clouds
                .as_ref()
                .and_then(|c| c.all)
                .map(percent_to_fraction),
            pressure_millibars: payload.main.pressure,
            daily_summary: condition.and_then(|c| c.description.clone()),
        })
    }
}

fn percent_to_fraction(percent: f64) -> f64 {
    percent / 100.0
}
