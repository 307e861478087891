//! Application configuration file support.
//!
//! Configuration is read from a TOML file (`stable.toml`) and then
//! overridden from environment variables:
//!
//! | Variable                 | Overrides                    |
//! |--------------------------|------------------------------|
//! | `STABLE_CONFIG`          | path of the config file      |
//! | `HOST`                   | `server.host`                |
//! | `PORT`                   | `server.port`                |
//! | `REPOSITORY_TYPE`        | `repository.type`            |
//! | `WELFARE_ON_INFRA_ERROR` | `welfare.on_infra_error`     |
//!
//! Every section is optional; a missing file yields the defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::db::RepositoryType;
use crate::models::WorkLimits;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// What the advisory check reports when the store fails mid-validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfraErrorPolicy {
    /// Surface the failure to the caller (503).
    #[default]
    Block,
    /// Report the candidate as valid, with a warning.
    Allow,
}

impl FromStr for InfraErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "block" => Ok(Self::Block),
            "allow" => Ok(Self::Allow),
            _ => Err(format!("Unknown infrastructure error policy: {}", s)),
        }
    }
}

impl fmt::Display for InfraErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block => f.write_str("block"),
            Self::Allow => f.write_str("allow"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub welfare: WelfareSettings,
}

/// Repository type settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type", default = "default_repo_type")]
    pub repo_type: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: default_repo_type(),
        }
    }
}

impl RepositorySettings {
    /// Get the repository type from configuration.
    pub fn repository_type(&self) -> Result<RepositoryType, String> {
        RepositoryType::from_str(&self.repo_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Welfare defaults applied to horses created without explicit limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WelfareSettings {
    #[serde(default)]
    pub on_infra_error: InfraErrorPolicy,
    #[serde(default = "default_max_work_hours")]
    pub default_max_work_hours: f64,
    #[serde(default = "default_rest_hours")]
    pub default_rest_hours: f64,
}

impl Default for WelfareSettings {
    fn default() -> Self {
        Self {
            on_infra_error: InfraErrorPolicy::default(),
            default_max_work_hours: default_max_work_hours(),
            default_rest_hours: default_rest_hours(),
        }
    }
}

impl WelfareSettings {
    /// Default limits as minutes.
    pub fn default_limits(&self) -> Result<WorkLimits, ConfigError> {
        WorkLimits::from_hours(self.default_max_work_hours, self.default_rest_hours).map_err(
            |message| ConfigError::Invalid {
                key: "welfare".to_string(),
                message,
            },
        )
    }
}

fn default_repo_type() -> String {
    "local".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_work_hours() -> f64 {
    4.0
}

fn default_rest_hours() -> f64 {
    1.0
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.welfare.default_limits()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `stable.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    ///
    /// Returns the defaults when no file exists.
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("stable.toml"),
            PathBuf::from("backend/stable.toml"),
            PathBuf::from("../stable.toml"),
        ];

        match search_paths.iter().find(|path| path.exists()) {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::from_file(path)
            }
            None => {
                log::info!("No stable.toml found, using default configuration");
                Ok(Self::default())
            }
        }
    }

    /// Load the file named by `STABLE_CONFIG` (or the default location),
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("STABLE_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::from_default_location()?,
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `HOST`, `PORT`, `REPOSITORY_TYPE` and `WELFARE_ON_INFRA_ERROR`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(host) = env_value("HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_value("PORT") {
            self.server.port = port.parse().map_err(|e| ConfigError::Invalid {
                key: "PORT".to_string(),
                message: format!("{}", e),
            })?;
        }
        if let Some(repo_type) = env_value("REPOSITORY_TYPE") {
            RepositoryType::from_str(&repo_type).map_err(|message| ConfigError::Invalid {
                key: "REPOSITORY_TYPE".to_string(),
                message,
            })?;
            self.repository.repo_type = repo_type;
        }
        if let Some(policy) = env_value("WELFARE_ON_INFRA_ERROR") {
            self.welfare.on_infra_error =
                policy.parse().map_err(|message| ConfigError::Invalid {
                    key: "WELFARE_ON_INFRA_ERROR".to_string(),
                    message,
                })?;
        }
        Ok(())
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.welfare.on_infra_error, InfraErrorPolicy::Block);
        let limits = config.welfare.default_limits().unwrap();
        assert_eq!(limits.max_work_minutes_per_day, 240);
        assert_eq!(limits.required_rest_minutes, 60);
        assert_eq!(
            config.repository.repository_type().unwrap(),
            RepositoryType::Local
        );
    }

    #[test]
    fn test_from_file_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9000

[welfare]
on_infra_error = "allow"
default_max_work_hours = 2.5
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.welfare.on_infra_error, InfraErrorPolicy::Allow);
        assert_eq!(
            config.welfare.default_limits().unwrap().max_work_minutes_per_day,
            150
        );
        assert_eq!(config.repository.repo_type, "local");
    }

    #[test]
    fn test_invalid_welfare_defaults_rejected() {
        let err = AppConfig::from_toml_str("[welfare]\ndefault_max_work_hours = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_unknown_policy_is_parse_error() {
        let err = AppConfig::from_toml_str("[welfare]\non_infra_error = \"maybe\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "ALLOW".parse::<InfraErrorPolicy>().unwrap(),
            InfraErrorPolicy::Allow
        );
        assert!("sometimes".parse::<InfraErrorPolicy>().is_err());
    }
}
