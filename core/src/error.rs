//! Structured error types for promptbench
//!
//! One taxonomy for the whole core: configuration loading, lookups during
//! dispatch, provider failures and durable-store problems. Every variant
//! carries enough context to be shown to the user as-is.

use std::path::PathBuf;
use thiserror::Error;

use crate::llm::ProviderError;

/// Primary error type for promptbench operations
#[derive(Error, Debug)]
pub enum BenchError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration source could not be read
    #[error("failed to load configuration from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    /// Configuration source is not valid YAML/JSON
    #[error("configuration is not valid structured data: {message}")]
    Parse { message: String },

    /// Configuration parsed but violates the schema
    #[error("configuration schema error{}: {message}", prompt_suffix(.prompt_id))]
    Schema {
        prompt_id: Option<String>,
        message: String,
    },

    // =========================================================================
    // Dispatch Errors
    // =========================================================================
    /// Dispatch requested for an unknown prompt
    #[error("prompt not found: {prompt_id}")]
    PromptNotFound { prompt_id: String },

    /// Prompt references a model configuration that does not exist
    #[error("model config not found: {model_config} (referenced by prompt '{prompt_id}')")]
    ModelConfigNotFound {
        prompt_id: String,
        model_config: String,
    },

    /// The completion boundary call failed
    #[error("execution of prompt '{prompt_id}' failed: {source}")]
    Execution {
        prompt_id: String,
        #[source]
        source: ProviderError,
    },

    /// Scenario index outside the configured range
    #[error("scenario {scenario} is out of range (0..{count})")]
    InvalidScenario { scenario: usize, count: usize },

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    /// Durable store write failed
    #[error("storage error for key '{key}': {message}")]
    Storage { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),
}

fn prompt_suffix(prompt_id: &Option<String>) -> String {
    match prompt_id {
        Some(id) => format!(" in prompt '{}'", id),
        None => String::new(),
    }
}

impl BenchError {
    pub fn schema(prompt_id: Option<&str>, message: impl Into<String>) -> Self {
        Self::Schema {
            prompt_id: prompt_id.map(str::to_string),
            message: message.into(),
        }
    }

    /// Lookup failures that only affect the one invocation
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::PromptNotFound { .. } | Self::ModelConfigNotFound { .. }
        )
    }

    /// Check if error requires user action before a retry can succeed
    pub fn requires_user_action(&self) -> bool {
        match self {
            Self::Execution { source, .. } => source.requires_user_action(),
            Self::ConfigLoad { .. } | Self::Parse { .. } | Self::Schema { .. } => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Execution { prompt_id, source } => match source {
                ProviderError::Unauthorized { .. } => {
                    "Authentication failed. Please check your API key.".to_string()
                }
                ProviderError::RateLimited { .. } => format!(
                    "The provider rate-limited prompt '{}'. Wait a moment and run it again.",
                    prompt_id
                ),
                _ => format!("Prompt '{}' failed: {}", prompt_id, source),
            },
            Self::ConfigLoad { path, .. } => {
                format!("Could not read the prompt configuration at {}.", path.display())
            }
            _ => self.to_string(),
        }
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias using BenchError
pub type Result<T> = std::result::Result<T, BenchError>;

/// Extension trait for converting lookups into dispatch errors
pub trait OptionExt<T> {
    fn ok_or_prompt_not_found(self, prompt_id: &str) -> Result<T>;
    fn ok_or_model_not_found(self, prompt_id: &str, model_config: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_prompt_not_found(self, prompt_id: &str) -> Result<T> {
        self.ok_or_else(|| BenchError::PromptNotFound {
            prompt_id: prompt_id.to_string(),
        })
    }

    fn ok_or_model_not_found(self, prompt_id: &str, model_config: &str) -> Result<T> {
        self.ok_or_else(|| BenchError::ModelConfigNotFound {
            prompt_id: prompt_id.to_string(),
            model_config: model_config.to_string(),
        })
    }
}
