//! Configuration management
//!
//! The prompt document (models, prompts, variables) and the application
//! settings around it.

pub mod loader;
pub mod schema;
pub mod settings;

pub use loader::{load, load_with_report, ConfigLoader, LoadReport, SchemaIssue};
pub use schema::{
    Configuration, DefaultValue, ModelSpec, PromptSpec, Provider, Template, VariableSpec,
    VariableType,
};
pub use settings::{ProviderSettings, Settings, DEFAULT_COST_PER_TOKEN, DEFAULT_SCENARIO_COUNT};
