// Configuration for the content pipeline

use super::error::OrchestratorError;
use super::registry::ModelRegistry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const TOKEN_ENV: &str = "REPLICATE_API_TOKEN";
pub const OUTPUT_DIR_ENV: &str = "MONTAGE_OUTPUT_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Per HTTP request; remote jobs themselves are never timed out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub models: ModelRegistry,
}

fn default_api_base() -> String {
    "https://api.replicate.com".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated_content")
}

fn default_poll_interval() -> u64 {
    1000
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            api_base: default_api_base(),
            output_dir: default_output_dir(),
            poll_interval_ms: default_poll_interval(),
            request_timeout_secs: None,
            models: ModelRegistry::default(),
        }
    }
}

/// `<config dir>/montage/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("montage").join("config.toml"))
}

impl ContentConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, OrchestratorError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            OrchestratorError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&contents).map_err(|e| {
            OrchestratorError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Resolve configuration from an explicit file, the user config file, `.env` and
    /// the process environment, in that order of increasing precedence
    pub fn load(path: Option<&Path>) -> Result<Self, OrchestratorError> {
        if let Ok(env_file) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", env_file.display());
        }

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(path)?,
                _ => Self::default(),
            },
        };

        config.overlay(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    pub fn overlay(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
            self.api_token = Some(token);
        }
        if let Some(dir) = lookup(OUTPUT_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
    }

    /// The API token, which must be present and non-blank
    pub fn api_token(&self) -> Result<&str, OrchestratorError> {
        self.api_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(OrchestratorError::MissingCredential)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
