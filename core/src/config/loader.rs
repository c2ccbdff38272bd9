//! Prompt configuration loader
//!
//! Turns a YAML or JSON document into a [`Configuration`]. Loading is
//! one-shot. Two policies are offered:
//!
//! - [`load`] is strict: the first schema problem fails the whole load.
//! - [`load_with_report`] is lenient: prompts (or models) with schema problems
//!   are dropped and reported, the rest of the configuration stays usable.
//!
//! Text that is not structured data at all fails both.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde_yml::Value;

use super::schema::{Configuration, ModelSpec, PromptSpec};
use crate::error::{BenchError, Result};

/// A schema problem found while loading leniently
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    /// Prompt the problem belongs to, `None` for model entries
    pub prompt_id: Option<String>,
    pub message: String,
}

impl SchemaIssue {
    fn new(prompt_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            prompt_id: prompt_id.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn into_error(self) -> BenchError {
        BenchError::Schema {
            prompt_id: self.prompt_id,
            message: self.message,
        }
    }
}

/// Outcome of a lenient load
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub configuration: Configuration,
    pub issues: Vec<SchemaIssue>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Strict load: any schema issue is an error
pub fn load(source: &str) -> Result<Configuration> {
    let report = load_with_report(source)?;
    match report.issues.into_iter().next() {
        Some(issue) => Err(issue.into_error()),
        None => Ok(report.configuration),
    }
}

/// Lenient load: unusable prompts are excluded and reported
pub fn load_with_report(source: &str) -> Result<LoadReport> {
    let root: Value = serde_yml::from_str(source).map_err(|e| BenchError::Parse {
        message: e.to_string(),
    })?;

    if !root.is_mapping() {
        return Err(BenchError::Parse {
            message: "expected a mapping with `models` and `prompts` at the document root"
                .to_string(),
        });
    }

    let mut issues = Vec::new();
    let models = parse_models(&root, &mut issues)?;
    let prompts = parse_prompts(&root, &models, &mut issues)?;

    for issue in &issues {
        tracing::warn!(
            prompt = issue.prompt_id.as_deref().unwrap_or("-"),
            "Skipping invalid configuration entry: {}",
            issue.message
        );
    }
    tracing::info!(
        "Loaded prompt configuration: {} models, {} prompts, {} issues",
        models.len(),
        prompts.len(),
        issues.len()
    );

    Ok(LoadReport {
        configuration: Configuration { models, prompts },
        issues,
    })
}

fn parse_models(root: &Value, issues: &mut Vec<SchemaIssue>) -> Result<BTreeMap<String, ModelSpec>> {
    let entries = root
        .get("models")
        .ok_or_else(|| BenchError::schema(None, "missing required field `models`"))?
        .as_mapping()
        .ok_or_else(|| BenchError::schema(None, "`models` must be a mapping of id to model"))?;

    let mut models = BTreeMap::new();
    for (key, value) in entries {
        let Some(id) = key.as_str() else {
            issues.push(SchemaIssue::new(None, "model ids must be strings"));
            continue;
        };
        match serde_yml::from_value::<ModelSpec>(value.clone()) {
            Ok(spec) => {
                models.insert(id.to_string(), spec);
            }
            Err(e) => issues.push(SchemaIssue::new(None, format!("model '{}': {}", id, e))),
        }
    }
    Ok(models)
}

fn parse_prompts(
    root: &Value,
    models: &BTreeMap<String, ModelSpec>,
    issues: &mut Vec<SchemaIssue>,
) -> Result<Vec<PromptSpec>> {
    let entries = root
        .get("prompts")
        .ok_or_else(|| BenchError::schema(None, "missing required field `prompts`"))?
        .as_sequence()
        .ok_or_else(|| BenchError::schema(None, "`prompts` must be a sequence"))?;

    let mut seen_ids = HashSet::new();
    let mut prompts = Vec::with_capacity(entries.len());

    for (index, value) in entries.iter().enumerate() {
        let raw_id = value.get("id").and_then(Value::as_str);
        let spec = match serde_yml::from_value::<PromptSpec>(value.clone()) {
            Ok(spec) => spec,
            Err(e) => {
                let message = match raw_id {
                    Some(_) => e.to_string(),
                    None => format!("prompt #{}: {}", index, e),
                };
                issues.push(SchemaIssue::new(raw_id, message));
                continue;
            }
        };

        if let Err(message) = validate_prompt(&spec, models) {
            issues.push(SchemaIssue::new(Some(&spec.id), message));
            continue;
        }

        if !seen_ids.insert(spec.id.clone()) {
            issues.push(SchemaIssue::new(Some(&spec.id), "duplicate prompt id"));
            continue;
        }

        prompts.push(spec);
    }
    Ok(prompts)
}

fn validate_prompt(
    spec: &PromptSpec,
    models: &BTreeMap<String, ModelSpec>,
) -> std::result::Result<(), String> {
    if spec.id.trim().is_empty() {
        return Err("prompt id cannot be empty".to_string());
    }

    if !models.contains_key(&spec.model_config) {
        return Err(format!(
            "modelConfig '{}' does not match any configured model",
            spec.model_config
        ));
    }

    let mut names = HashSet::new();
    for variable in &spec.variables {
        if !names.insert(variable.name.as_str()) {
            return Err(format!("variable '{}' is declared twice", variable.name));
        }
    }

    let mains = spec.variables.iter().filter(|v| v.is_main).count();
    if mains > 1 {
        return Err(format!("{} variables are marked isMain, at most one allowed", mains));
    }

    Ok(())
}

/// Loader bound to a configuration file on disk
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| BenchError::ConfigLoad {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Strict load from file
    pub fn load(&self) -> Result<Configuration> {
        load(&self.read()?)
    }

    /// Lenient load from file
    pub fn load_with_report(&self) -> Result<LoadReport> {
        load_with_report(&self.read()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{DefaultValue, Provider, Template, VariableType};

    const YAML: &str = r#"
models:
  fast:
    provider: openai
    model: gpt-4o-mini
    temperature: 0.2
    max_tokens: 256
  careful:
    provider: anthropic
    model: claude-3-5-sonnet
    temperature: 0.7
    max_tokens: 1024
prompts:
  - id: summary
    name: Summary
    description: Summarise an article
    template: "Summarise {article} in a {tone} tone"
    variables:
      - name: article
        description: Article text
        type: string
        isMain: true
      - name: tone
        description: Writing tone
        type: string
        isMain: false
        options: [formal, casual]
        default: formal
    modelConfig: fast
  - id: critique
    name: Critique
    description: Critique an article
    template:
      - "Read this:"
      - "{article}"
      - "Give {count} points."
    variables:
      - name: article
        description: The article
        type: string
        isMain: true
      - name: count
        description: Number of points
        type: number
        isMain: false
        default: 3
    modelConfig: careful
"#;

    #[test]
    fn test_load_yaml() {
        let config = load(YAML).unwrap();

        assert_eq!(config.models.len(), 2);
        assert_eq!(config.prompts.len(), 2);
        assert_eq!(config.models["careful"].provider, Provider::Anthropic);
        assert_eq!(config.models["fast"].max_tokens, Some(256));

        let summary = config.prompt("summary").unwrap();
        assert_eq!(summary.model_config, "fast");
        assert_eq!(summary.main_variable().unwrap().name, "article");
        assert_eq!(
            summary.variables[1].options.as_deref(),
            Some(&["formal".to_string(), "casual".to_string()][..])
        );

        let critique = config.prompt("critique").unwrap();
        assert_eq!(
            critique.template.normalize(),
            "Read this:\n{article}\nGive {count} points."
        );
        assert_eq!(critique.variables[1].var_type, VariableType::Number);
        assert_eq!(
            critique.variables[1].default.as_ref().map(DefaultValue::to_string).as_deref(),
            Some("3")
        );
    }

    #[test]
    fn test_load_json() {
        let json = r#"{
            "models": {"m": {"provider": "openai", "model": "gpt-4o", "temperature": 1.0, "max_tokens": 50}},
            "prompts": [{
                "id": "p",
                "name": "P",
                "description": "",
                "template": "Hi {who}",
                "variables": [{"name": "who", "description": "", "type": "string", "isMain": true}],
                "modelConfig": "m"
            }]
        }"#;

        let config = load(json).unwrap();
        assert_eq!(config.prompts[0].template, Template::Single("Hi {who}".to_string()));
    }

    #[test]
    fn test_unknown_provider_maps_to_other() {
        let yaml = "models: {m: {provider: mistral, model: x}}\nprompts: []\n";
        let config = load(yaml).unwrap();
        assert_eq!(config.models["m"].provider, Provider::Other);
        assert_eq!(config.models["m"].temperature, None);
    }

    #[test]
    fn test_parse_error_for_invalid_text() {
        let result = load("models: [unclosed");
        assert!(matches!(result, Err(BenchError::Parse { .. })));

        let result = load("just a sentence");
        assert!(matches!(result, Err(BenchError::Parse { .. })));
    }

    #[test]
    fn test_schema_error_for_missing_sections() {
        let result = load("prompts: []");
        assert!(matches!(result, Err(BenchError::Schema { .. })));

        let result = load("models: {}");
        assert!(matches!(result, Err(BenchError::Schema { .. })));
    }

    #[test]
    fn test_schema_error_for_missing_template() {
        let yaml = r#"
models: {m: {model: x}}
prompts:
  - id: broken
    variables: []
    modelConfig: m
"#;
        match load(yaml) {
            Err(BenchError::Schema { prompt_id, message }) => {
                assert_eq!(prompt_id.as_deref(), Some("broken"));
                assert!(message.contains("template"));
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_error_for_unresolved_model() {
        let yaml = r#"
models: {m: {model: x}}
prompts:
  - id: orphan
    template: "x"
    variables: []
    modelConfig: missing
"#;
        let err = load(yaml).unwrap_err();
        assert!(err.to_string().contains("modelConfig 'missing'"));
    }

    #[test]
    fn test_lenient_load_skips_only_bad_prompts() {
        let yaml = r#"
models: {m: {model: x}}
prompts:
  - id: good
    template: "ok {a}"
    variables: [{name: a}]
    modelConfig: m
  - id: orphan
    template: "x"
    variables: []
    modelConfig: missing
  - id: two-mains
    template: "{a} {b}"
    variables: [{name: a, isMain: true}, {name: b, isMain: true}]
    modelConfig: m
  - id: good
    template: "dup"
    variables: []
    modelConfig: m
"#;
        let report = load_with_report(yaml).unwrap();

        assert_eq!(report.configuration.prompts.len(), 1);
        assert_eq!(report.configuration.prompts[0].id, "good");
        assert_eq!(report.configuration.prompts[0].template.normalize(), "ok {a}");

        let flagged: Vec<_> = report
            .issues
            .iter()
            .map(|i| i.prompt_id.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(flagged, vec!["orphan", "two-mains", "good"]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_duplicate_variable_name_in_prompt() {
        let yaml = r#"
models: {m: {model: x}}
prompts:
  - id: p
    template: "{a}"
    variables: [{name: a}, {name: a}]
    modelConfig: m
"#;
        let err = load(yaml).unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_loader_reports_unreadable_file() {
        let loader = ConfigLoader::new("/definitely/not/here/prompts.yaml");
        assert!(matches!(loader.load(), Err(BenchError::ConfigLoad { .. })));
    }

    #[test]
    fn test_loader_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.yaml");
        std::fs::write(&path, YAML).unwrap();

        let config = ConfigLoader::new(&path).load().unwrap();
        assert_eq!(config.prompts.len(), 2);
    }
}
