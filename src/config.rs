//! # Configuration
//!
//! JSON configuration file with serde defaults for every field. A missing
//! file means "all defaults"; an unreadable or malformed one is an error.
//!
//! `SCRIPTORIUM_DATA_DIR` overrides `data_dir`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::activity::DEFAULT_ACTIVITY_LIMIT;
use crate::auth::session::MAX_TTL_DAYS;
use crate::auth::{AuthorityConfig, SessionConfig, DEFAULT_OWNER_ID};
use crate::http_server::HttpServerConfig;
use crate::observability::LogFormat;

/// Environment variable overriding `data_dir`
pub const DATA_DIR_ENV: &str = "SCRIPTORIUM_DATA_DIR";

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "./scriptorium.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one `<key>.json` file per document
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub server: HttpServerConfig,

    /// Identity that is always `owner`
    #[serde(default = "default_owner_id")]
    pub owner_id: String,

    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: i64,

    /// Maximum retained activity entries
    #[serde(default = "default_activity_limit")]
    pub activity_limit: usize,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_owner_id() -> String {
    DEFAULT_OWNER_ID.to_string()
}

fn default_session_ttl_days() -> i64 {
    30
}

fn default_activity_limit() -> usize {
    DEFAULT_ACTIVITY_LIMIT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            server: HttpServerConfig::default(),
            owner_id: default_owner_id(),
            session_ttl_days: default_session_ttl_days(),
            activity_limit: default_activity_limit(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_file(path)?;
        config.apply_overrides(std::env::var(DATA_DIR_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Ok(serde_json::from_str(&content)?)
    }

    fn apply_overrides(&mut self, data_dir: Option<String>) {
        if let Some(dir) = data_dir.filter(|d| !d.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }
        if self.owner_id.trim().is_empty() {
            return Err(ConfigError::Invalid("owner_id must not be empty".into()));
        }
        if self.session_ttl_days <= 0 || self.session_ttl_days > MAX_TTL_DAYS {
            return Err(ConfigError::Invalid(format!(
                "session_ttl_days must be between 1 and {}",
                MAX_TTL_DAYS
            )));
        }
        if self.activity_limit == 0 {
            return Err(ConfigError::Invalid("activity_limit must be > 0".into()));
        }
        Ok(())
    }

    pub fn authority_config(&self) -> AuthorityConfig {
        AuthorityConfig {
            owner_id: self.owner_id.clone(),
            session: SessionConfig::with_ttl_days(self.session_ttl_days),
        }
    }

    /// Session cookie lifetime in seconds
    pub fn session_max_age_secs(&self) -> i64 {
        self.session_ttl_days * 24 * 60 * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_file(&temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.session_max_age_secs(), 2592000);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scriptorium.json");
        fs::write(
            &path,
            json!({"data_dir": "/srv/comments", "server": {"port": 9090}, "log_format": "json"})
                .to_string(),
        )
        .unwrap();

        let config = Config::load_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/comments"));
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.activity_limit, 1000);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scriptorium.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(matches!(Config::load_file(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            session_ttl_days: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            session_ttl_days: MAX_TTL_DAYS + 1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            session_ttl_days: i64::MAX,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            session_ttl_days: MAX_TTL_DAYS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = Config {
            owner_id: " ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_data_dir_override() {
        let mut config = Config::default();
        config.apply_overrides(Some("/tmp/elsewhere".into()));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/elsewhere"));

        config.apply_overrides(Some("".into()));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/elsewhere"));
    }

    #[test]
    fn test_authority_config() {
        let config = Config {
            owner_id: "42".into(),
            session_ttl_days: 7,
            ..Default::default()
        };
        let authority = config.authority_config();
        assert_eq!(authority.owner_id, "42");
        assert_eq!(authority.session.ttl, chrono::Duration::days(7));
    }
}
