//! Cross-prompt variable aggregation
//!
//! Prompts that share a variable name share one input field. This module
//! derives that deduplicated field list from a [`Configuration`]. It is
//! recomputed on demand and never persisted.

use serde::Serialize;

use crate::config::{Configuration, DefaultValue, VariableType};

/// One input field, merged across every prompt that declares the name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedVariable {
    pub name: String,
    /// Distinct descriptions from contributing prompts, newline separated
    pub description: String,
    /// True if any contributing prompt marks the variable main
    pub is_main: bool,
    /// Contributing prompt ids in visitation order, no duplicates
    pub prompt_ids: Vec<String>,
    // Seeded from the first occurrence
    pub var_type: VariableType,
    pub options: Option<Vec<String>>,
    pub default: Option<DefaultValue>,
}

/// Merge variable declarations across all prompts
///
/// Output order is first occurrence: prompts in configuration order, then
/// each prompt's own variable order.
pub fn aggregate(config: &Configuration) -> Vec<AggregatedVariable> {
    let mut merged: Vec<AggregatedVariable> = Vec::new();

    for prompt in &config.prompts {
        for variable in &prompt.variables {
            match merged.iter_mut().find(|v| v.name == variable.name) {
                None => merged.push(AggregatedVariable {
                    name: variable.name.clone(),
                    description: variable.description.clone(),
                    is_main: variable.is_main,
                    prompt_ids: vec![prompt.id.clone()],
                    var_type: variable.var_type,
                    options: variable.options.clone(),
                    default: variable.default.clone(),
                }),
                Some(existing) => {
                    if !existing.prompt_ids.contains(&prompt.id) {
                        existing.prompt_ids.push(prompt.id.clone());
                    }
                    if !existing.description.contains(variable.description.as_str()) {
                        if !existing.description.is_empty() {
                            existing.description.push('\n');
                        }
                        existing.description.push_str(&variable.description);
                    }
                    existing.is_main |= variable.is_main;
                }
            }
        }
    }

    merged
}

/// The merged variables flagged main, in aggregation order
pub fn main_variables(variables: &[AggregatedVariable]) -> Vec<&AggregatedVariable> {
    variables.iter().filter(|v| v.is_main).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PromptSpec, Template, VariableSpec};

    fn var(name: &str, description: &str, is_main: bool) -> VariableSpec {
        VariableSpec {
            name: name.to_string(),
            description: description.to_string(),
            var_type: VariableType::String,
            is_main,
            options: None,
            default: None,
        }
    }

    fn prompt(id: &str, variables: Vec<VariableSpec>) -> PromptSpec {
        PromptSpec {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            template: Template::from(""),
            variables,
            model_config: "m".to_string(),
        }
    }

    fn config(prompts: Vec<PromptSpec>) -> Configuration {
        Configuration {
            models: Default::default(),
            prompts,
        }
    }

    #[test]
    fn test_empty_configuration() {
        assert!(aggregate(&Configuration::default()).is_empty());
    }

    #[test]
    fn test_merges_shared_names() {
        let cfg = config(vec![
            prompt("a", vec![var("topic", "The topic", false), var("tone", "Tone", false)]),
            prompt("b", vec![var("topic", "Subject of the essay", true)]),
            prompt("c", vec![var("audience", "Readers", false), var("topic", "The topic", false)]),
        ]);

        let vars = aggregate(&cfg);
        let names: Vec<_> = vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["topic", "tone", "audience"]);

        let topic = &vars[0];
        assert_eq!(topic.prompt_ids, vec!["a", "b", "c"]);
        assert_eq!(topic.description, "The topic\nSubject of the essay");
        assert!(topic.is_main);

        assert!(!vars[1].is_main);
        assert_eq!(vars[2].prompt_ids, vec!["c"]);
    }

    #[test]
    fn test_description_substring_not_repeated() {
        let cfg = config(vec![
            prompt("a", vec![var("x", "Long description of x", false)]),
            prompt("b", vec![var("x", "description", false)]),
            prompt("c", vec![var("x", "", false)]),
        ]);

        let vars = aggregate(&cfg);
        assert_eq!(vars[0].description, "Long description of x");
    }

    #[test]
    fn test_first_description_empty() {
        let cfg = config(vec![
            prompt("a", vec![var("x", "", false)]),
            prompt("b", vec![var("x", "Filled later", false)]),
        ]);

        // No leading newline when the first description is empty
        let vars = aggregate(&cfg);
        assert_eq!(vars[0].description, "Filled later");
    }

    #[test]
    fn test_main_flag_is_or_across_prompts() {
        let cfg = config(vec![
            prompt("a", vec![var("x", "d", true)]),
            prompt("b", vec![var("x", "d", false)]),
        ]);
        assert!(aggregate(&cfg)[0].is_main);
    }

    #[test]
    fn test_idempotent() {
        let cfg = config(vec![
            prompt("a", vec![var("x", "one", true), var("y", "why", false)]),
            prompt("b", vec![var("y", "another why", false)]),
        ]);
        assert_eq!(aggregate(&cfg), aggregate(&cfg));
    }

    #[test]
    fn test_prompt_ids_count_matches_references() {
        let cfg = config(vec![
            prompt("a", vec![var("x", "", false)]),
            prompt("b", vec![var("y", "", false)]),
            prompt("c", vec![var("x", "", false)]),
            prompt("d", vec![var("x", "", false), var("y", "", false)]),
        ]);
        let vars = aggregate(&cfg);
        assert_eq!(vars[0].prompt_ids, vec!["a", "c", "d"]);
        assert_eq!(vars[1].prompt_ids, vec!["b", "d"]);
    }

    #[test]
    fn test_main_variables() {
        let cfg = config(vec![prompt(
            "a",
            vec![var("x", "", false), var("y", "", true)],
        )]);
        let vars = aggregate(&cfg);
        let mains = main_variables(&vars);
        assert_eq!(mains.len(), 1);
        assert_eq!(mains[0].name, "y");
    }
}
