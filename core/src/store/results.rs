//! Result store
//!
//! At most one live [`ExecutionResult`] per (prompt, scenario). A new result
//! for an existing key replaces the old one in place, so display order is
//! the order keys were first seen. Every mutation rewrites the persisted
//! snapshot.

use std::sync::Arc;

use super::{read_snapshot, write_snapshot, KeyValueStore};
use crate::error::Result;
use crate::result::{ExecutionResult, ScenarioId};

/// Durable entry holding the serialized result sequence
pub const PROMPT_RESULTS_KEY: &str = "prompt-results";

pub struct ResultStore {
    entries: Vec<ExecutionResult>,
    port: Arc<dyn KeyValueStore>,
}

impl ResultStore {
    /// Empty store persisting through `port`
    pub fn new(port: Arc<dyn KeyValueStore>) -> Self {
        Self {
            entries: Vec::new(),
            port,
        }
    }

    /// Rebuild from the last persisted snapshot
    ///
    /// Missing or corrupt snapshots yield an empty store.
    pub fn load_from(port: Arc<dyn KeyValueStore>) -> Self {
        let entries: Vec<ExecutionResult> =
            read_snapshot(port.as_ref(), PROMPT_RESULTS_KEY).unwrap_or_default();
        tracing::debug!("Restored {} execution results", entries.len());
        Self { entries, port }
    }

    /// Insert, or replace the entry with the same key in place; then persist
    pub fn upsert(&mut self, result: ExecutionResult) -> Result<()> {
        match self
            .entries
            .iter_mut()
            .find(|e| e.matches(&result.prompt_id, result.scenario_id))
        {
            Some(existing) => *existing = result,
            None => self.entries.push(result),
        }
        self.persist()
    }

    pub fn get(&self, prompt_id: &str, scenario_id: ScenarioId) -> Option<&ExecutionResult> {
        self.entries.iter().find(|e| e.matches(prompt_id, scenario_id))
    }

    /// All scenarios' results for one prompt, in store order
    pub fn for_prompt<'a>(&'a self, prompt_id: &'a str) -> impl Iterator<Item = &'a ExecutionResult> + 'a {
        self.entries.iter().filter(move |e| e.prompt_id == prompt_id)
    }

    pub fn entries(&self) -> &[ExecutionResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every result and persist the empty snapshot
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        write_snapshot(self.port.as_ref(), PROMPT_RESULTS_KEY, &self.entries)
    }
}

impl std::fmt::Debug for ResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStore")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}
