//! Execution results and their derived metrics

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Index of one independent column of variable assignments
pub type ScenarioId = usize;

/// Per-call metrics derived from the provider's token count and the
/// measured latency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsData {
    pub token_usage: u64,
    /// Milliseconds
    pub latency: u64,
    /// Tokens per second; 0.0 when latency is 0 ms
    pub inference_speed: f64,
    /// Estimated USD
    pub compute_cost: f64,
}

impl MetricsData {
    pub fn compute(token_usage: u64, latency_ms: u64, cost_per_token: f64) -> Self {
        // A 0 ms call has no measurable throughput; keep the value finite
        let inference_speed = if latency_ms == 0 {
            0.0
        } else {
            token_usage as f64 / (latency_ms as f64 / 1000.0)
        };

        Self {
            token_usage,
            latency: latency_ms,
            inference_speed,
            compute_cost: token_usage as f64 * cost_per_token,
        }
    }
}

impl fmt::Display for MetricsData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tokens, {}ms, {:.1} tok/s, ${:.4}",
            self.token_usage, self.latency, self.inference_speed, self.compute_cost
        )
    }
}

/// Outcome of one dispatch, keyed by (prompt, scenario)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub prompt_id: String,
    pub scenario_id: ScenarioId,
    pub metrics: MetricsData,
    /// Raw provider text
    pub output: String,
    /// JSON snapshot of the variable values used
    pub variables: String,
    pub completed_at: DateTime<Utc>,
}

impl ExecutionResult {
    pub fn key(&self) -> (&str, ScenarioId) {
        (&self.prompt_id, self.scenario_id)
    }

    pub fn matches(&self, prompt_id: &str, scenario_id: ScenarioId) -> bool {
        self.prompt_id == prompt_id && self.scenario_id == scenario_id
    }
}
