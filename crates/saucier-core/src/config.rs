//! Configuration management for saucier.
//!
//! Loads configuration from ${SAUCIER_HOME}/config.toml with sensible defaults.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Default CloudKit Web Services host.
pub const DEFAULT_BASE_URL: &str = "https://api.apple-cloudkit.com";

/// Default location the app boots at.
pub const DEFAULT_LOCATION: &str = "https://www.saucier-app.com/";

const API_TOKEN_ENV: &str = "SAUCIER_CLOUDKIT_API_TOKEN";
const CONTAINER_ENV: &str = "SAUCIER_CONTAINER_IDENTIFIER";
const ENVIRONMENT_ENV: &str = "SAUCIER_CLOUDKIT_ENVIRONMENT";
const BASE_URL_ENV: &str = "SAUCIER_CLOUDKIT_BASE_URL";

/// CloudKit environment the container is addressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CloudKitEnvironment {
    #[default]
    Development,
    Production,
}

impl CloudKitEnvironment {
    pub fn as_str(self) -> &'static str {
        match self {
            CloudKitEnvironment::Development => "development",
            CloudKitEnvironment::Production => "production",
        }
    }
}

impl fmt::Display for CloudKitEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloudKitEnvironment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(CloudKitEnvironment::Development),
            "production" => Ok(CloudKitEnvironment::Production),
            other => bail!("Unknown CloudKit environment '{other}' (expected development or production)"),
        }
    }
}

/// `[cloudkit]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudKitConfig {
    /// API token generated in the CloudKit dashboard.
    pub api_token: Option<String>,
    /// Container identifier, e.g. `iCloud.com.example.app`.
    pub container_identifier: Option<String>,
    pub environment: CloudKitEnvironment,
    /// Overrides the Web Services host.
    pub base_url: Option<String>,
}

/// `[app]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Location the app boots at when none is given.
    pub location: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            location: DEFAULT_LOCATION.to_string(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cloudkit: CloudKitConfig,
    pub app: AppConfig,
}

fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

impl Config {
    /// Loads configuration from the default path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    ///
    /// # Errors
    /// Returns an error if the file exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}

/// Resolved connection settings for the CloudKit container.
#[derive(Debug, Clone)]
pub struct CloudKitSettings {
    pub base_url: String,
    pub container_identifier: String,
    pub environment: CloudKitEnvironment,
    pub api_token: String,
}

impl CloudKitSettings {
    /// Resolves settings from config and environment.
    ///
    /// # Errors
    /// Returns an error if the API token or container is missing, or if an
    /// override is malformed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_token = resolve_required(
            config.cloudkit.api_token.as_deref(),
            API_TOKEN_ENV,
            "cloudkit.api_token",
        )?;
        let container_identifier = resolve_required(
            config.cloudkit.container_identifier.as_deref(),
            CONTAINER_ENV,
            "cloudkit.container_identifier",
        )?;

        let environment = match non_empty_env(ENVIRONMENT_ENV) {
            Some(value) => value
                .parse()
                .with_context(|| format!("Invalid {ENVIRONMENT_ENV}"))?,
            None => config.cloudkit.environment,
        };

        let base_url = resolve_base_url(config.cloudkit.base_url.as_deref())?;

        Ok(Self {
            base_url,
            container_identifier,
            environment,
            api_token,
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Resolves a required value with precedence: config > env.
fn resolve_required(config_value: Option<&str>, env_var: &str, key: &str) -> Result<String> {
    if let Some(value) = config_value {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    non_empty_env(env_var).with_context(|| format!("{key} or {env_var} is required"))
}

/// Resolves the base URL with precedence: env > config > default.
fn resolve_base_url(config_base_url: Option<&str>) -> Result<String> {
    let candidate = non_empty_env(BASE_URL_ENV).or_else(|| {
        config_base_url
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    });

    match candidate {
        Some(value) => {
            url::Url::parse(&value)
                .with_context(|| format!("Invalid CloudKit base URL: {value}"))?;
            Ok(value.trim_end_matches('/').to_string())
        }
        None => Ok(DEFAULT_BASE_URL.to_string()),
    }
}

pub mod paths {
    //! Path resolution for saucier configuration and data.
    //!
    //! SAUCIER_HOME resolution order:
    //! 1. SAUCIER_HOME environment variable (if set)
    //! 2. ~/.config/saucier (default)

    use std::path::PathBuf;

    /// Returns the saucier home directory.
    pub fn saucier_home() -> PathBuf {
        if let Ok(home) = std::env::var("SAUCIER_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".saucier"),
            |h| h.join(".config").join("saucier"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        saucier_home().join("config.toml")
    }

    /// Returns the path to the durable session token file.
    pub fn session_path() -> PathBuf {
        saucier_home().join("session.json")
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nonexistent.toml")).unwrap();

        assert_eq!(config.cloudkit.environment, CloudKitEnvironment::Development);
        assert!(config.cloudkit.api_token.is_none());
        assert_eq!(config.app.location, DEFAULT_LOCATION);
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[cloudkit]\nenvironment = \"production\"\ncontainer_identifier = \"iCloud.test\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.cloudkit.environment, CloudKitEnvironment::Production);
        assert_eq!(
            config.cloudkit.container_identifier.as_deref(),
            Some("iCloud.test")
        );
        assert_eq!(config.app.location, DEFAULT_LOCATION);
    }

    #[test]
    fn test_load_rejects_unknown_environment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[cloudkit]\nenvironment = \"staging\"\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_init_creates_template_that_parses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::init(&path).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.cloudkit.environment, CloudKitEnvironment::Development);

        let err = Config::init(&path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_settings_prefer_config_values() {
        let config = Config {
            cloudkit: CloudKitConfig {
                api_token: Some("  key-from-config ".to_string()),
                container_identifier: Some("iCloud.config".to_string()),
                environment: CloudKitEnvironment::Production,
                base_url: Some("http://127.0.0.1:9999/".to_string()),
            },
            app: AppConfig::default(),
        };

        let settings = CloudKitSettings::from_config(&config).unwrap();
        assert_eq!(settings.api_token, "key-from-config");
        assert_eq!(settings.container_identifier, "iCloud.config");
        assert_eq!(settings.base_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(
            "Production".parse::<CloudKitEnvironment>().unwrap(),
            CloudKitEnvironment::Production
        );
        assert!("qa".parse::<CloudKitEnvironment>().is_err());
    }
}
