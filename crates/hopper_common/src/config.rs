//! Hopper Configuration
//!
//! Config file: ~/.config/hopper/config.toml (or $HOPPER_CONFIG)
//!
//! Resolution order for each value:
//! 1. Explicit path passed on the command line
//! 2. $HOPPER_CONFIG
//! 3. ~/.config/hopper/config.toml
//! 4. Defaults
//!
//! `HOPPER_LEDGER`, `HOPPER_MODEL` and `HOPPER_ENDPOINT` override the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::scoring::OutOfRangePolicy;

/// Default ledger location, relative to the working directory
pub const DEFAULT_LEDGER_PATH: &str = "hopper/blockchain.json";

/// Default local model
pub const DEFAULT_MODEL: &str = "llama3.1:latest";

/// Default Ollama endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Ledger storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the chain
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from(DEFAULT_LEDGER_PATH)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            ledger_path: default_ledger_path(),
        }
    }
}

/// Text generation backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

/// Confidence scoring settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Handling of explicit scores outside [0, 1]
    #[serde(default)]
    pub out_of_range: OutOfRangePolicy,
}

/// Main Hopper configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HopperConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl HopperConfig {
    /// Get default user config path: ~/.config/hopper/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hopper").join("config.toml"))
    }

    /// Load configuration, optionally from an explicit file.
    ///
    /// An explicit or `$HOPPER_CONFIG` path must exist; the user config file
    /// is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os("HOPPER_CONFIG").map(PathBuf::from);

        let mut config = match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path)?,
            None => match Self::user_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    fn apply_env_overrides(&mut self) {
        if let Some(path) = std::env::var_os("HOPPER_LEDGER") {
            self.storage.ledger_path = PathBuf::from(path);
        }
        if let Ok(model) = std::env::var("HOPPER_MODEL") {
            self.llm.model = model;
        }
        if let Ok(endpoint) = std::env::var("HOPPER_ENDPOINT") {
            self.llm.endpoint = endpoint;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HopperConfig::default();
        assert_eq!(config.storage.ledger_path, PathBuf::from("hopper/blockchain.json"));
        assert_eq!(config.llm.model, "llama3.1:latest");
        assert_eq!(config.llm.endpoint, "http://localhost:11434");
        assert_eq!(config.scoring.out_of_range, OutOfRangePolicy::PassThrough);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = HopperConfig::from_toml(
            r#"
[llm]
model = "qwen2.5:7b"

[scoring]
out_of_range = "clamp"
"#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "qwen2.5:7b");
        assert_eq!(config.llm.endpoint, DEFAULT_ENDPOINT);
        assert!(config.llm.enabled);
        assert_eq!(config.scoring.out_of_range, OutOfRangePolicy::Clamp);
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = HopperConfig::default();
        config.storage.ledger_path = PathBuf::from("/tmp/ledger.json");
        let text = config.to_toml().unwrap();
        assert_eq!(HopperConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(HopperConfig::from_toml("[llm\nmodel = ").is_err());
    }

    #[test]
    fn test_from_file_reports_missing_path() {
        let err = HopperConfig::from_file(Path::new("/nonexistent/hopper.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
