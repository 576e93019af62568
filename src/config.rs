//! Configuration management for the weather report.
//!
//! All settings come from the process environment (a `.env` file in the
//! working directory is loaded first when present). Missing required values
//! are reported before any connection is attempted.

use crate::db::DatabaseBackend;
use crate::error::{ReportError, Result};
use url::Url;

/// Default OpenWeatherMap current-weather endpoint.
pub const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// City ingested when `WEATHER_CITY` is not set.
pub const DEFAULT_CITY: &str = "New York";

/// Main configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage connection settings.
    pub database: ConnectionConfig,

    /// Upstream weather API settings.
    pub weather: WeatherConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Storage engine to connect to.
    pub backend: DatabaseBackend,

    /// Database host.
    pub host: Option<String>,

    /// Database port.
    pub port: u16,

    /// Database name (a file path for SQLite).
    pub database: Option<String>,

    /// Database user.
    pub user: Option<String>,

    /// Database password.
    pub password: Option<String>,
}

/// Weather API configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherConfig {
    /// API token sent as `appid`.
    pub api_token: String,

    /// City name to fetch observations for.
    pub city: String,

    /// Endpoint URL.
    pub api_url: String,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is normal; only the variables matter.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration using the given variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| ReportError::config(format!("{key} is not set")))
        };

        let backend = match get("DB_BACKEND") {
            Some(name) => DatabaseBackend::parse(&name).ok_or_else(|| {
                ReportError::config(format!(
                    "Unknown DB_BACKEND '{name}'. Expected 'postgres' or 'sqlite'"
                ))
            })?,
            None => DatabaseBackend::default(),
        };

        let database = match backend {
            DatabaseBackend::Postgres => {
                let (host, port) = parse_server(&require("DB_SERVER")?, backend.default_port())?;
                ConnectionConfig {
                    backend,
                    host: Some(host),
                    port,
                    database: Some(require("DB_DATABASE")?),
                    user: Some(require("DB_USERNAME")?),
                    password: Some(require("DB_PASSWORD")?),
                }
            }
            DatabaseBackend::Sqlite => ConnectionConfig {
                backend,
                database: Some(require("DB_DATABASE")?),
                ..Default::default()
            },
        };

        let weather = WeatherConfig {
            api_token: require("WEATHER_API_TOKEN")?,
            city: get("WEATHER_CITY").unwrap_or_else(|| DEFAULT_CITY.to_string()),
            api_url: get("WEATHER_API_URL").unwrap_or_else(|| DEFAULT_WEATHER_API_URL.to_string()),
        };

        Ok(Self { database, weather })
    }
}

/// Splits `host` or `host:port` into its parts.
fn parse_server(server: &str, default_port: u16) -> Result<(String, u16)> {
    match server.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => {
            let port = port
                .parse()
                .map_err(|_| ReportError::config(format!("Invalid port in DB_SERVER: '{port}'")))?;
            Ok((host.to_string(), port))
        }
        _ => Ok((server.to_string(), default_port)),
    }
}

impl ConnectionConfig {
    /// Converts the connection config to a driver connection string.
    pub fn to_connection_string(&self) -> Result<String> {
        let database = self
            .database
            .as_deref()
            .ok_or_else(|| ReportError::config("Database name is required"))?;

        match self.backend {
            DatabaseBackend::Postgres => {
                let host = self.host.as_deref().unwrap_or("localhost");
                let mut url = Url::parse(&format!("postgres://{host}:{}", self.port))
                    .map_err(|e| ReportError::config(format!("Invalid server '{host}': {e}")))?;

                if let Some(user) = &self.user {
                    url.set_username(user)
                        .map_err(|_| ReportError::config("Invalid database user"))?;
                    if let Some(password) = &self.password {
                        url.set_password(Some(password))
                            .map_err(|_| ReportError::config("Invalid database password"))?;
                    }
                }
                url.set_path(database);

                Ok(url.to_string())
            }
            DatabaseBackend::Sqlite if database == ":memory:" => Ok("sqlite::memory:".to_string()),
            DatabaseBackend::Sqlite => Ok(format!("sqlite:{database}?mode=rwc")),
        }
    }

    /// Returns a display-safe string (no password) for log output.
    pub fn display_string(&self) -> String {
        let database = self.database.as_deref().unwrap_or("unknown");
        match self.backend {
            DatabaseBackend::Postgres => {
                let host = self.host.as_deref().unwrap_or("localhost");
                format!("{database} @ {host}:{}", self.port)
            }
            DatabaseBackend::Sqlite => format!("sqlite {database}"),
        }
    }
}
