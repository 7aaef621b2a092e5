//! Configuration file management
//!
//! Handles finding, loading, and validating configuration files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{AppConfig, RequestSettings};

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./apitest-runner.yaml",
    "./apitest-runner.yml",
    "./.apitest-runner.yaml",
    "./.apitest-runner/config.yaml",
    "~/.config/apitest-runner/config.yaml",
    "~/.apitest-runner.yaml",
];

/// Full configuration file structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Version of config file format
    #[serde(default = "default_version")]
    pub version: String,

    /// Job runner settings
    #[serde(default)]
    pub app: AppConfig,

    /// Request executor settings
    #[serde(default)]
    pub request: RequestSettings,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl ConfigFile {
    /// Create a new config file with defaults
    pub fn new() -> Self {
        Self {
            version: default_version(),
            ..Default::default()
        }
    }

    /// Example configuration for `config init`
    pub fn example() -> Self {
        Self {
            version: default_version(),
            app: AppConfig {
                max_workers: 4,
                job_timeout_secs: 300,
                output_dir: "apitest-results".to_string(),
                runner_bin: "cypress".to_string(),
                format: "table".to_string(),
            },
            request: RequestSettings {
                base_url: Some("https://api.example.com".to_string()),
                retries: 3,
                retry_delay_ms: 1000,
                timeout_secs: 30,
                account_id: Some("your-account-id".to_string()),
                client_id: None,
                environment: Some("stage".to_string()),
            },
        }
    }

    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        for location in CONFIG_LOCATIONS {
            let path = expand_path(location);
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self> {
        if let Some(path) = Self::find() {
            Self::load(&path)
        } else {
            Ok(Self::new())
        }
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !["1.0"].contains(&self.version.as_str()) {
            anyhow::bail!("Unsupported config version: {}", self.version);
        }

        if self.app.max_workers == 0 {
            anyhow::bail!("app.max_workers must be at least 1");
        }

        if self.app.job_timeout_secs == 0 {
            anyhow::bail!("app.job_timeout_secs must be positive");
        }

        if self.request.retry_delay_ms == 0 {
            anyhow::bail!("request.retry_delay_ms must be positive");
        }

        Ok(())
    }
}

/// Expand `~` in a path
fn expand_path(location: &str) -> PathBuf {
    if let Some(rest) = location.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(location)
}

/// Check if a path points at a YAML file
fn is_yaml_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ConfigFile::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.version, "1.0");
    }

    #[test]
    fn test_example_config_is_valid() {
        assert!(ConfigFile::example().validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = ConfigFile::new();
        config.app.max_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_retry_delay_rejected() {
        let mut config = ConfigFile::new();
        config.request.retry_delay_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = ConfigFile::example();
        config.app.max_workers = 7;
        config.save(&path).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded.app.max_workers, 7);
        assert_eq!(
            loaded.request.base_url.as_deref(),
            Some("https://api.example.com")
        );
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        ConfigFile::example().save(&path).unwrap();
        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded.app.runner_bin, "cypress");
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let mut config = ConfigFile::new();
        config.version = "9.9".to_string();
        assert!(config.validate().is_err());
    }
}
