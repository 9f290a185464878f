//! Client configuration
//!
//! Loaded once from `config.json` at startup and handed to each component
//! explicitly. Only the Supabase URL and key are required.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::delivery::RetryPolicy;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not found! Please copy config.example.json to config.json")]
    NotFound(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub supabase_url: String,

    pub supabase_key: String,

    #[serde(default)]
    pub operator_callsign: Option<String>,

    #[serde(default = "default_udp_host")]
    pub udp_host: String,

    #[serde(default = "default_udp_port")]
    pub udp_port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_file")]
    pub log_file: String,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Seconds between delivery attempts
    #[serde(default = "default_retry_delay")]
    pub retry_delay: f64,

    /// `retry_delay` as checked by `validate`
    #[serde(skip)]
    retry_delay_duration: Duration,
}

fn default_udp_host() -> String {
    "0.0.0.0".to_string()
}

fn default_udp_port() -> u16 {
    2237
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_log_file() -> String {
    "qsolive_client.log".to_string()
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay() -> f64 {
    5.0
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound(path.display().to_string()),
            _ => ConfigError::Io {
                path: path.display().to_string(),
                source: e,
            },
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_json::from_str(content)?;
        config.retry_delay_duration = config.validate()?;
        Ok(config)
    }

    /// Check the values serde can't, returning the retry delay as a Duration
    fn validate(&self) -> Result<Duration, ConfigError> {
        if self.supabase_url.trim().is_empty() {
            return Err(ConfigError::Invalid("supabase_url is empty".to_string()));
        }
        match reqwest::Url::parse(self.supabase_url.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "supabase_url '{}' is not an http(s) URL",
                    self.supabase_url
                )))
            }
        }
        if self.supabase_key.trim().is_empty() {
            return Err(ConfigError::Invalid("supabase_key is empty".to_string()));
        }
        let retry_delay = Duration::try_from_secs_f64(self.retry_delay).map_err(|e| {
            ConfigError::Invalid(format!(
                "retry_delay must be a non-negative number of seconds, got {} ({})",
                self.retry_delay, e
            ))
        })?;
        if crate::logging::parse_level(&self.log_level).is_none() {
            return Err(ConfigError::Invalid(format!("unknown log_level '{}'", self.log_level)));
        }
        Ok(retry_delay)
    }

    /// Configured callsign, `None` when unset or blank
    pub fn operator_callsign(&self) -> Option<String> {
        self.operator_callsign
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    }

    pub fn udp_address(&self) -> String {
        format!("{}:{}", self.udp_host, self.udp_port)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, self.retry_delay_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"{
        "supabase_url": "https://abc.supabase.co",
        "supabase_key": "anon-key"
    }"#;

    #[test]
    fn test_defaults() {
        let config = Config::from_json(MINIMAL).unwrap();
        assert_eq!(config.udp_address(), "0.0.0.0:2237");
        assert_eq!(config.log_level, "INFO");
        assert_eq!(config.log_file, "qsolive_client.log");
        assert_eq!(config.operator_callsign(), None);
        assert_eq!(config.retry_policy(), RetryPolicy::new(3, Duration::from_secs(5)));
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "supabase_url": "https://abc.supabase.co/",
            "supabase_key": "anon-key",
            "operator_callsign": "K1ABC",
            "udp_host": "127.0.0.1",
            "udp_port": 2333,
            "log_level": "debug",
            "log_file": "relay.log",
            "retry_attempts": 5,
            "retry_delay": 0.5,
            "some_future_option": true
        }"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.udp_address(), "127.0.0.1:2333");
        assert_eq!(config.operator_callsign().as_deref(), Some("K1ABC"));
        assert_eq!(config.retry_policy(), RetryPolicy::new(5, Duration::from_millis(500)));
    }

    #[test]
    fn test_blank_operator_is_unset() {
        let json = r#"{"supabase_url": "https://a.b", "supabase_key": "k", "operator_callsign": " "}"#;
        assert_eq!(Config::from_json(json).unwrap().operator_callsign(), None);
    }

    #[test]
    fn test_missing_required_fields() {
        assert!(matches!(
            Config::from_json(r#"{"supabase_url": "https://a.b"}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(Config::from_json("not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            r#"{"supabase_url": "", "supabase_key": "k"}"#,
            r#"{"supabase_url": "ftp://a.b", "supabase_key": "k"}"#,
            r#"{"supabase_url": "https://a.b", "supabase_key": ""}"#,
            r#"{"supabase_url": "https://a.b", "supabase_key": "k", "retry_delay": -1}"#,
            r#"{"supabase_url": "https://a.b", "supabase_key": "k", "retry_delay": 1e20}"#,
            r#"{"supabase_url": "https://a.b", "supabase_key": "k", "log_level": "LOUD"}"#,
        ];
        for json in cases {
            assert!(
                matches!(Config::from_json(json), Err(ConfigError::Invalid(_))),
                "accepted {}",
                json
            );
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.supabase_key, "anon-key");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_file(dir.path().join("config.json"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
