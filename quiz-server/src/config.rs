use quiz_core::{CatalogOrder, DEFAULT_POLL_INTERVAL};
use quiz_persistence::connection::DEFAULT_DATABASE_URL;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub host_password: String,
    pub join_code: Option<String>,
    pub questions_file: Option<String>,
    pub poll_interval: Duration,
    pub question_order: CatalogOrder,
    pub connection_timeout_seconds: u64,
}

fn parse_var<T: FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let poll_interval_ms: u64 = parse_var(
            "POLL_INTERVAL_MS",
            &DEFAULT_POLL_INTERVAL.as_millis().to_string(),
        )?;
        if poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "POLL_INTERVAL_MS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", "8080")?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            host_password: optional_var("HOST_PASSWORD")
                .ok_or(ConfigError::Missing("HOST_PASSWORD"))?,
            join_code: optional_var("JOIN_CODE"),
            questions_file: optional_var("QUESTIONS_FILE"),
            poll_interval: Duration::from_millis(poll_interval_ms),
            question_order: parse_var("QUESTION_ORDER", "numeric")?,
            connection_timeout_seconds: parse_var("CONNECTION_TIMEOUT_SECONDS", "300")?,
        })
    }

    /// Settings for tests and local runs.
    pub fn with_passphrases(host_password: &str, join_code: Option<&str>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "sqlite::memory:".to_string(),
            host_password: host_password.to_string(),
            join_code: join_code.map(str::to_string),
            questions_file: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            question_order: CatalogOrder::Numeric,
            connection_timeout_seconds: 300,
        }
    }
}
