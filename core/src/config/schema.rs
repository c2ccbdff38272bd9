//! Prompt configuration schema definitions.
//!
//! These structs mirror the declarative prompt document: a mapping of model
//! configurations and an ordered list of prompts, each with a template and
//! the variable slots the template refers to. Field names follow the
//! document (`isMain`, `modelConfig`, `max_tokens`).
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Backend family named by a model configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Openai,
    Anthropic,
    #[serde(other)]
    Other,
}

/// An LLM backend configuration, referenced by id from prompts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelSpec {
    #[serde(default)]
    pub provider: Provider,
    /// Model identifier sent to the provider
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Declared type of a variable slot.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    #[default]
    String,
    Number,
    Boolean,
}

/// Default value of a variable as written in the document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Bool(b) => write!(f, "{}", b),
            DefaultValue::Number(n) => write!(f, "{}", n),
            DefaultValue::Text(s) => f.write_str(s),
        }
    }
}

/// A named slot within a prompt template.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VariableSpec {
    /// Unique within its prompt, not globally
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub var_type: VariableType,
    #[serde(rename = "isMain", default)]
    pub is_main: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
}

/// Prompt template text: a single string or lines joined with `\n`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Template {
    Single(String),
    Lines(Vec<String>),
}

impl Template {
    /// The template as one string. Every consumer goes through here.
    pub fn normalize(&self) -> Cow<'_, str> {
        match self {
            Template::Single(text) => Cow::Borrowed(text),
            Template::Lines(lines) => Cow::Owned(lines.join("\n")),
        }
    }
}

impl From<&str> for Template {
    fn from(text: &str) -> Self {
        Template::Single(text.to_string())
    }
}

/// A named prompt: template, variable slots and model reference.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PromptSpec {
    /// Unique across the configuration
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub template: Template,
    pub variables: Vec<VariableSpec>,
    /// Id of the ModelSpec this prompt runs against
    #[serde(rename = "modelConfig")]
    pub model_config: String,
}

impl PromptSpec {
    /// The variable flagged as this prompt's main one, if any
    pub fn main_variable(&self) -> Option<&VariableSpec> {
        self.variables.iter().find(|v| v.is_main)
    }
}

/// Root aggregate, immutable once loaded. Reload replaces it wholesale.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    pub models: BTreeMap<String, ModelSpec>,
    pub prompts: Vec<PromptSpec>,
}

impl Configuration {
    pub fn prompt(&self, id: &str) -> Option<&PromptSpec> {
        self.prompts.iter().find(|p| p.id == id)
    }

    pub fn model(&self, id: &str) -> Option<&ModelSpec> {
        self.models.get(id)
    }

    pub fn model_for(&self, prompt: &PromptSpec) -> Option<&ModelSpec> {
        self.model(&prompt.model_config)
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}
