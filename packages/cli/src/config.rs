// ABOUTME: Server configuration loaded from environment variables
// ABOUTME: Listener address, CORS origin, database connection, and the workflow webhook

use collector_runs::WebhookConfig;
use collector_storage::DatabaseConfig;
use std::env;
use std::net::IpAddr;
use std::num::ParseIntError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid host address: {0}")]
    InvalidHost(String),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub cors_origin: String,
    pub database: DatabaseConfig,
    /// `None` when N8N_WEBHOOK_URL is unset; triggering runs is then refused
    pub webhook: Option<WebhookConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("PORT")
            .unwrap_or_else(|| "4001".to_string())
            .parse::<u16>()?;

        // Validate port is in valid range
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let host_str = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let host = host_str
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidHost(host_str.clone()))?;

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        let mut database = match lookup("DATABASE_URL").filter(|u| !u.is_empty()) {
            Some(url) => DatabaseConfig::new(url),
            None => DatabaseConfig::default(),
        };
        if let Some(value) = lookup("DATABASE_MAX_CONNECTIONS") {
            database.max_connections = value
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: "DATABASE_MAX_CONNECTIONS",
                    value,
                })?;
        }

        let webhook = match lookup("N8N_WEBHOOK_URL").filter(|u| !u.is_empty()) {
            Some(url) => {
                let mut webhook = WebhookConfig::new(url);
                webhook.username = lookup("N8N_WEBHOOK_USER").filter(|u| !u.is_empty());
                webhook.password = lookup("N8N_WEBHOOK_PASSWORD");
                if let Some(value) = lookup("WEBHOOK_TIMEOUT_SECS") {
                    let secs = value
                        .parse::<u64>()
                        .ok()
                        .filter(|s| *s > 0)
                        .ok_or(ConfigError::InvalidValue {
                            key: "WEBHOOK_TIMEOUT_SECS",
                            value,
                        })?;
                    webhook.timeout = Duration::from_secs(secs);
                }
                Some(webhook)
            }
            None => None,
        };

        Ok(Config {
            host,
            port,
            cors_origin,
            database,
            webhook,
        })
    }
}
