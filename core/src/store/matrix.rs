//! Variable value matrix
//!
//! User-entered values: variable name → scenario → text. Written through to
//! the durable store on every edit.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{read_snapshot, write_snapshot, KeyValueStore};
use crate::error::Result;
use crate::result::ScenarioId;

/// Durable entry holding the serialized matrix
pub const VARIABLE_VALUES_KEY: &str = "variable-values";

pub struct VariableValueMatrix {
    values: BTreeMap<String, BTreeMap<ScenarioId, String>>,
    port: Arc<dyn KeyValueStore>,
}

impl VariableValueMatrix {
    pub fn new(port: Arc<dyn KeyValueStore>) -> Self {
        Self {
            values: BTreeMap::new(),
            port,
        }
    }

    /// Rebuild from the last persisted snapshot; missing or corrupt → empty
    pub fn load_from(port: Arc<dyn KeyValueStore>) -> Self {
        let values = read_snapshot(port.as_ref(), VARIABLE_VALUES_KEY).unwrap_or_default();
        Self { values, port }
    }

    /// Set one cell and persist the whole matrix
    pub fn upsert(&mut self, name: &str, scenario: ScenarioId, value: impl Into<String>) -> Result<()> {
        self.values
            .entry(name.to_string())
            .or_default()
            .insert(scenario, value.into());
        write_snapshot(self.port.as_ref(), VARIABLE_VALUES_KEY, &self.values)
    }

    pub fn get(&self, name: &str, scenario: ScenarioId) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|by_scenario| by_scenario.get(&scenario))
            .map(String::as_str)
    }

    /// Every value entered for one scenario, as an interpolation map
    pub fn scenario_values(&self, scenario: ScenarioId) -> HashMap<String, String> {
        self.values
            .iter()
            .filter_map(|(name, by_scenario)| {
                by_scenario
                    .get(&scenario)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for VariableValueMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariableValueMatrix")
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}
