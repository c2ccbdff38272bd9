//! User-visible, dismissible notices
//!
//! Failed dispatches and configuration problems end up here instead of
//! aborting the session.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use promptbench_core::ScenarioId;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: Uuid,
    /// Prompt the notice is about, if any
    pub prompt_id: Option<String>,
    pub scenario_id: Option<ScenarioId>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Notices {
    entries: Mutex<Vec<Notice>>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &self,
        prompt_id: Option<&str>,
        scenario_id: Option<ScenarioId>,
        message: impl Into<String>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.entries.lock().push(Notice {
            id,
            prompt_id: prompt_id.map(str::to_string),
            scenario_id,
            message: message.into(),
            created_at: Utc::now(),
        });
        id
    }

    /// Oldest first
    pub fn list(&self) -> Vec<Notice> {
        self.entries.lock().clone()
    }

    /// Returns false when no notice has that id
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|n| n.id != id);
        entries.len() != before
    }

    /// Drop notices not tied to a scenario (configuration problems)
    pub fn clear_configuration_scoped(&self) {
        self.entries.lock().retain(|n| n.scenario_id.is_some());
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
