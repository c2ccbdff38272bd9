//! Per-(prompt, scenario) in-flight indicators
//!
//! Overlapping dispatches for one key are counted, so the indicator stays on
//! until the last of them finishes. Marks are released by guard drop, which
//! also covers early returns and panics inside a dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use promptbench_core::ScenarioId;

type Key = (String, ScenarioId);

#[derive(Debug, Clone, Default)]
pub struct InFlight {
    counts: Arc<Mutex<HashMap<Key, usize>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the key running until the returned guard is dropped
    pub fn begin(&self, prompt_id: &str, scenario_id: ScenarioId) -> InFlightGuard {
        let key = (prompt_id.to_string(), scenario_id);
        *self.counts.lock().entry(key.clone()).or_insert(0) += 1;
        InFlightGuard {
            counts: Arc::clone(&self.counts),
            key,
        }
    }

    pub fn is_running(&self, prompt_id: &str, scenario_id: ScenarioId) -> bool {
        self.counts
            .lock()
            .contains_key(&(prompt_id.to_string(), scenario_id))
    }

    /// Every key with at least one dispatch outstanding, sorted
    pub fn running(&self) -> Vec<(String, ScenarioId)> {
        let mut keys: Vec<Key> = self.counts.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[must_use = "the key is only marked running while the guard is alive"]
#[derive(Debug)]
pub struct InFlightGuard {
    counts: Arc<Mutex<HashMap<Key, usize>>>,
    key: Key,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut counts = self.counts.lock();
        if let Some(count) = counts.get_mut(&self.key) {
            *count -= 1;
            if *count == 0 {
                counts.remove(&self.key);
            }
        }
    }
}
