use std::time::Duration;

use thiserror::Error;

const DEFAULT_JWKS_URL: &str = "https://api.clerk.com/v1/jwks";
const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";
const DEFAULT_NASA_BASE_URL: &str = "https://api.nasa.gov";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration, read once at startup.
///
/// Only `DATABASE_URL` is needed to boot. Provider keys stay optional here;
/// a request that needs an absent key fails that provider call instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub auth_secret_key: Option<String>,
    pub auth_jwks_url: String,
    pub openweather_api_key: Option<String>,
    pub openweather_base_url: String,
    pub nasa_api_key: Option<String>,
    pub nasa_base_url: String,
    pub completion_api_key: Option<String>,
    pub completion_base_url: String,
    pub completion_model: String,
    pub http_timeout: Duration,
    /// `None` allows any origin
    pub cors_origins: Option<Vec<String>>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let or_default =
            |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid {
                    name: "HTTP_TIMEOUT_SECS",
                    value: raw,
                })?,
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let cors_origins = get("DAYPLAN_CORS_ORIGINS")
            .filter(|raw| raw != "*")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty());

        Ok(Self {
            database_url,
            auth_secret_key: get("AUTH_SECRET_KEY"),
            auth_jwks_url: or_default("AUTH_JWKS_URL", DEFAULT_JWKS_URL),
            openweather_api_key: get("OPENWEATHER_API_KEY"),
            openweather_base_url: or_default("OPENWEATHER_BASE_URL", DEFAULT_OPENWEATHER_BASE_URL),
            nasa_api_key: get("NASA_API_KEY"),
            nasa_base_url: or_default("NASA_BASE_URL", DEFAULT_NASA_BASE_URL),
            completion_api_key: get("COMPLETION_API_KEY"),
            completion_base_url: or_default("COMPLETION_BASE_URL", DEFAULT_COMPLETION_BASE_URL),
            completion_model: or_default("COMPLETION_MODEL", DEFAULT_COMPLETION_MODEL),
            http_timeout,
            cors_origins,
            port,
        })
    }
}
