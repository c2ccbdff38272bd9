//! Application settings
//!
//! Where the prompt document lives, where durable state goes, how many
//! scenarios to show and how to reach the completion provider. Stored as
//! TOML; every field has a default so an absent file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::client::{sanitize_base_url, DEFAULT_BASE_URL};

/// Scenarios shown side by side unless configured otherwise
pub const DEFAULT_SCENARIO_COUNT: usize = 3;

/// Rough USD estimate per consumed token
pub const DEFAULT_COST_PER_TOKEN: f64 = 0.00002;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Prompt configuration document (YAML or JSON)
    #[serde(default = "default_prompts_path")]
    pub prompts_path: PathBuf,

    /// Directory for the result store, variable matrix and debug log
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_scenario_count")]
    pub scenario_count: usize,

    #[serde(default = "default_cost_per_token")]
    pub cost_per_token: f64,

    #[serde(default)]
    pub provider: ProviderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key; the key itself is never stored
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_prompts_path() -> PathBuf {
    PathBuf::from("prompts/prompts.yaml")
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("promptbench"))
        .unwrap_or_else(|| PathBuf::from(".promptbench"))
}

fn default_scenario_count() -> usize {
    DEFAULT_SCENARIO_COUNT
}

fn default_cost_per_token() -> f64 {
    DEFAULT_COST_PER_TOKEN
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prompts_path: default_prompts_path(),
            data_dir: default_data_dir(),
            scenario_count: default_scenario_count(),
            cost_per_token: default_cost_per_token(),
            provider: ProviderSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings as TOML, creating the parent directory
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from the default location, falling back to defaults
    pub fn load_or_default() -> Self {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                match Self::load(&path) {
                    Ok(settings) => return settings,
                    Err(e) => tracing::warn!("Ignoring settings at {}: {}", path.display(), e),
                }
            }
        }
        Self::default()
    }

    /// `<config dir>/promptbench/settings.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("promptbench").join("settings.toml"))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.scenario_count == 0 {
            anyhow::bail!("scenario_count must be greater than 0");
        }
        if !self.cost_per_token.is_finite() || self.cost_per_token < 0.0 {
            anyhow::bail!("cost_per_token must be a non-negative number");
        }
        if self.provider.timeout_secs == 0 {
            anyhow::bail!("provider.timeout_secs must be greater than 0");
        }
        sanitize_base_url(&self.provider.base_url)?;
        Ok(())
    }
}
