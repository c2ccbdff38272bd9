//! Template interpolation
//!
//! A placeholder is the literal `{name}` for any name in the value map, so
//! names with dashes, spaces or non-ASCII letters work too. Every occurrence
//! is replaced in one left-to-right pass; substituted text is never scanned
//! again. Names missing from the value map are left verbatim, so a partially
//! filled template is still a valid, renderable prompt.
//!
//! [`placeholders`] and [`unresolved`] only recognise identifier-shaped
//! names (ASCII letters, digits, underscores) and exist for diagnostics.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is valid"))
}

/// Fill `{name}` placeholders from `values`
pub fn interpolate(template: &str, values: &HashMap<String, String>) -> String {
    let mut slots: Vec<(String, &str)> = values
        .iter()
        .map(|(name, value)| (format!("{{{}}}", name), value.as_str()))
        .collect();
    // Longest first, so `{a}}` is preferred over `{a}` at the same position
    slots.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut filled = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        filled.push_str(&rest[..open]);
        let tail = &rest[open..];
        match slots
            .iter()
            .find(|(placeholder, _)| tail.starts_with(placeholder.as_str()))
        {
            Some((placeholder, value)) => {
                filled.push_str(value);
                rest = &tail[placeholder.len()..];
            }
            None => {
                filled.push('{');
                rest = &tail[1..];
            }
        }
    }
    filled.push_str(rest);
    filled
}

/// Distinct placeholder names in first-occurrence order
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in placeholder_regex().captures_iter(template) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Placeholder names that `values` does not cover
pub fn unresolved(template: &str, values: &HashMap<String, String>) -> Vec<String> {
    placeholders(template)
        .into_iter()
        .filter(|name| !values.contains_key(name))
        .collect()
}
