//! Service configuration read from the environment.

use std::{
    env,
    net::{AddrParseError, SocketAddr},
    time::Duration,
};

use thiserror::Error;
use todo_core::PipelineConfig;

const DEFAULT_PORT: &str = "3000";
const DEFAULT_SLOW_REQUEST_MS: u64 = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub slow_request_threshold: Duration,
    pub seed_sample_data: bool,
    pub log_format: LogFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid TODO_BIND_ADDR: {0}")]
    BindAddrParse(#[from] AddrParseError),
    #[error("invalid PORT: {0}")]
    InvalidPort(String),
    #[error("invalid TODO_SLOW_REQUEST_MS: {0}")]
    InvalidSlowRequestMs(String),
    #[error("invalid TODO_SEED_SAMPLE_DATA: {0}")]
    InvalidSeedSampleData(String),
    #[error("invalid TODO_LOG_FORMAT: {0}")]
    InvalidLogFormat(String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            slow_request_threshold: Duration::from_millis(DEFAULT_SLOW_REQUEST_MS),
            seed_sample_data: false,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = match lookup("TODO_BIND_ADDR") {
            Some(addr) => addr.trim().parse()?,
            None => {
                let port = lookup("PORT").unwrap_or_else(|| DEFAULT_PORT.to_string());
                let port = port
                    .trim()
                    .parse::<u16>()
                    .map_err(|error| ConfigError::InvalidPort(format!("{port}: {error}")))?;
                SocketAddr::from(([127, 0, 0, 1], port))
            }
        };
        let slow_request_threshold = match lookup("TODO_SLOW_REQUEST_MS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|error| ConfigError::InvalidSlowRequestMs(format!("{value}: {error}")))?,
            None => Duration::from_millis(DEFAULT_SLOW_REQUEST_MS),
        };
        let seed_sample_data = match lookup("TODO_SEED_SAMPLE_DATA") {
            Some(value) => {
                parse_bool(&value).ok_or(ConfigError::InvalidSeedSampleData(value))?
            }
            None => false,
        };
        let log_format = match lookup("TODO_LOG_FORMAT") {
            Some(value) => parse_log_format(&value).ok_or(ConfigError::InvalidLogFormat(value))?,
            None => LogFormat::Text,
        };

        Ok(Self {
            bind_addr,
            slow_request_threshold,
            seed_sample_data,
            log_format,
        })
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            slow_request_threshold: self.slow_request_threshold,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_log_format(value: &str) -> Option<LogFormat> {
    match value.trim().to_ascii_lowercase().as_str() {
        "text" => Some(LogFormat::Text),
        "json" => Some(LogFormat::Json),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(config_from(&[]).unwrap(), Config::default());
    }

    #[test]
    fn port_is_used_without_bind_addr() {
        let config = config_from(&[("PORT", "8081")]).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8081".parse().unwrap());
    }

    #[test]
    fn bind_addr_wins_over_port() {
        let config = config_from(&[("TODO_BIND_ADDR", "0.0.0.0:9000"), ("PORT", "8081")]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000".parse().unwrap());
    }

    #[test]
    fn all_settings_are_read() {
        let config = config_from(&[
            ("TODO_SLOW_REQUEST_MS", "250"),
            ("TODO_SEED_SAMPLE_DATA", "true"),
            ("TODO_LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert_eq!(config.slow_request_threshold, Duration::from_millis(250));
        assert!(config.seed_sample_data);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.pipeline().slow_request_threshold, Duration::from_millis(250));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("TODO_BIND_ADDR", "nowhere")]),
            Err(ConfigError::BindAddrParse(_))
        ));
        assert!(matches!(
            config_from(&[("PORT", "99999")]),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            config_from(&[("TODO_SLOW_REQUEST_MS", "-1")]),
            Err(ConfigError::InvalidSlowRequestMs(_))
        ));
        assert!(matches!(
            config_from(&[("TODO_SEED_SAMPLE_DATA", "maybe")]),
            Err(ConfigError::InvalidSeedSampleData(_))
        ));
        assert!(matches!(
            config_from(&[("TODO_LOG_FORMAT", "xml")]),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }
}
