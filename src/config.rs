use std::collections::HashMap;
use thiserror::Error;

/// Seconds a SEARCHING trip waits for a driver before auto-cancelling.
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 120;

/// Vehicle category used for tariff lookup until per-request categories
/// are exposed.
pub const DEFAULT_VEHICLE_CATEGORY: &str = "STANDARD";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub routing_api_url: String,
    pub routing_api_key: Option<String>,
    pub search_timeout_secs: u64,
    pub timeout_poll_secs: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let routing_api_url = env_map
            .get("ROUTING_API_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("ROUTING_API_URL".to_string()))?;

        let routing_api_key = env_map.get("ROUTING_API_KEY").cloned();

        let search_timeout_secs = env_map
            .get("SEARCH_TIMEOUT_SECS")
            .map(|s| s.as_str())
            .map(|s| {
                s.parse::<u64>().map_err(|_| {
                    ConfigError::InvalidValue(
                        "SEARCH_TIMEOUT_SECS".to_string(),
                        "must be a valid u64".to_string(),
                    )
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_SEARCH_TIMEOUT_SECS);

        let timeout_poll_secs = env_map
            .get("TIMEOUT_POLL_SECS")
            .map(|s| s.as_str())
            .map(|s| {
                s.parse::<u64>().map_err(|_| {
                    ConfigError::InvalidValue(
                        "TIMEOUT_POLL_SECS".to_string(),
                        "must be a valid u64".to_string(),
                    )
                })
            })
            .transpose()?
            .unwrap_or(1);

        Ok(Config {
            port,
            database_path,
            routing_api_url,
            routing_api_key,
            search_timeout_secs,
            timeout_poll_secs,
        })
    }
}
