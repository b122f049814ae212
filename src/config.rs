//! Configuration for the task board.
//!
//! Priority, highest first:
//! 1. Environment variables (a `.env` file is loaded first by the binary)
//! 2. TOML config file (`$TASKBOARD_CONFIG` or `<config dir>/taskboard/config.toml`)
//! 3. Compiled defaults
//!
//! A missing default config file is not an error. A path named through
//! `TASKBOARD_CONFIG` that doesn't exist is.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

// All fields optional so a file can override just a few settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    api_url: Option<String>,
    poll_interval_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the task store, without the `/api/tasks` suffix.
    pub api_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub log_level: String,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
            log_level: "info".to_string(),
            log_file: default_log_file(),
        }
    }
}

fn default_log_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("taskboard")
        .join("taskboard.log")
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("taskboard").join("config.toml"))
}

impl Config {
    /// Loads the config file and applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var_os("TASKBOARD_CONFIG") {
            Some(path) => Some(read_file(PathBuf::from(path))?),
            None => match default_config_path() {
                Some(path) if path.exists() => Some(read_file(path)?),
                _ => None,
            },
        };

        let mut config = Config::default().merge_file(file.unwrap_or_default());
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(raw)?;
        let config = Config::default().merge_file(file);
        config.validate()?;
        Ok(config)
    }

    fn merge_file(mut self, file: ConfigFile) -> Self {
        if let Some(url) = file.api_url {
            self.api_url = url;
        }
        if let Some(secs) = file.poll_interval_secs {
            self.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        if let Some(path) = file.log_file {
            self.log_file = path;
        }
        self
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TASKBOARD_API_URL") {
            self.api_url = url;
        }
        if let Some(raw) = lookup("TASKBOARD_POLL_SECS") {
            self.poll_interval = Duration::from_secs(parse_secs("TASKBOARD_POLL_SECS", &raw)?);
        }
        if let Some(raw) = lookup("TASKBOARD_TIMEOUT_SECS") {
            self.request_timeout =
                Duration::from_secs(parse_secs("TASKBOARD_TIMEOUT_SECS", &raw)?);
        }
        if let Some(level) = lookup("TASKBOARD_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(path) = lookup("TASKBOARD_LOG_FILE") {
            self.log_file = PathBuf::from(path);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval < Duration::from_secs(1) {
            return Err(ConfigError::InvalidValue {
                key: "poll_interval_secs",
                reason: "must be at least 1 second".to_string(),
            });
        }
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "api_url",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn read_file(path: PathBuf) -> Result<ConfigFile, ConfigError> {
    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
        path: path.clone(),
        source,
    })?;
    Ok(toml::from_str(&raw)?)
}

fn parse_secs(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            api_url = "https://tasks.example.com"
            poll_interval_secs = 15
            "#,
        )
        .unwrap();

        assert_eq!(config.api_url, "https://tasks.example.com");
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let err = Config::from_toml("poll_interval_secs = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "poll_interval_secs",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_toml_is_reported() {
        let err = Config::from_toml("api_url = ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("TASKBOARD_API_URL", "http://10.0.0.2:9000"),
            ("TASKBOARD_POLL_SECS", "30"),
            ("TASKBOARD_LOG_FILE", "/tmp/board.log"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::from_toml(r#"api_url = "http://file""#).unwrap();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api_url, "http://10.0.0.2:9000");
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.log_file, PathBuf::from("/tmp/board.log"));
    }

    #[test]
    fn test_non_numeric_env_value_is_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == "TASKBOARD_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "TASKBOARD_TIMEOUT_SECS",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = read_file(PathBuf::from("/nonexistent/taskboard/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
