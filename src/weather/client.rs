//! HTTP client for the OpenWeatherMap current-weather endpoint.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::debug;

use super::CurrentWeather;
use crate::config::WeatherConfig;
use crate::error::{ReportError, Result};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Fetches current observations for a city.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    api_url: String,
    api_token: String,
}

impl WeatherClient {
    /// Creates a client from the weather configuration.
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        Self::with_timeout(config, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(config: &WeatherConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::fetch(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_token: config.api_token.clone(),
        })
    }

    /// Performs one GET for `city` in metric units.
    ///
    /// Non-success statuses become fetch errors carrying the status code.
    pub async fn fetch_current(&self, city: &str) -> Result<CurrentWeather> {
        debug!(city, url = %self.api_url, "Fetching current weather");

        let response = self
            .client
            .get(&self.api_url)
            .query(&[("q", city), ("appid", self.api_token.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReportError::fetch("Weather API request timed out")
                } else {
                    ReportError::fetch(format!("Weather API request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ReportError::fetch(format!("Failed to read weather response: {e}")))?;

        if !status.is_success() {
            return Err(Self::status_error(status, &body));
        }

        CurrentWeather::from_json(&body)
    }

    fn status_error(status: StatusCode, body: &str) -> ReportError {
        if status == StatusCode::UNAUTHORIZED {
            return ReportError::fetch(format!(
                "Weather API returned {status}. Check WEATHER_API_TOKEN."
            ));
        }

        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_else(|| body.trim().to_string());

        ReportError::fetch(format!("Weather API returned {status}: {detail}"))
    }
}
