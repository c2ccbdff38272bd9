//! Execution dispatcher
//!
//! Resolves a prompt and its model, interpolates the template with one
//! scenario's values, calls the completion boundary once and turns the
//! response into an [`ExecutionResult`].
//!
//! The dispatcher does not touch the result store; callers decide what to do
//! with the outcome. No retries, no timeout beyond the boundary's own, no
//! cancellation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::time::Instant;

use crate::config::Configuration;
use crate::error::{BenchError, OptionExt, Result};
use crate::llm::{CompletionBoundary, CompletionRequest, Credentials};
use crate::result::{ExecutionResult, MetricsData, ScenarioId};
use crate::template;
use crate::{error_log, info_log, warn_log};

#[derive(Clone)]
pub struct Dispatcher {
    boundary: Arc<dyn CompletionBoundary>,
    cost_per_token: f64,
}

impl Dispatcher {
    pub fn new(boundary: Arc<dyn CompletionBoundary>, cost_per_token: f64) -> Self {
        Self {
            boundary,
            cost_per_token,
        }
    }

    pub fn cost_per_token(&self) -> f64 {
        self.cost_per_token
    }

    /// Run one prompt for one scenario
    pub async fn run(
        &self,
        prompt_id: &str,
        scenario_id: ScenarioId,
        values: &HashMap<String, String>,
        config: &Configuration,
        credentials: &Credentials,
    ) -> Result<ExecutionResult> {
        let prompt = config.prompt(prompt_id).ok_or_prompt_not_found(prompt_id)?;
        let model = config
            .model_for(prompt)
            .ok_or_model_not_found(prompt_id, &prompt.model_config)?;

        let template_text = prompt.template.normalize();
        let missing = template::unresolved(&template_text, values);
        if !missing.is_empty() {
            warn_log!(
                "Prompt '{}' scenario {}: no value for {}",
                prompt_id,
                scenario_id,
                missing.join(", ")
            );
        }
        let text = template::interpolate(&template_text, values);

        let request = CompletionRequest::single_user(&model.model, text)
            .with_temperature(model.temperature)
            .with_max_tokens(model.max_tokens);

        tracing::debug!(prompt_id, scenario_id, model = %model.model, "dispatching prompt");
        let started = Instant::now();
        let response = self
            .boundary
            .complete(&request, credentials)
            .await
            .map_err(|source| {
                error_log!("Prompt '{}' scenario {} failed: {}", prompt_id, scenario_id, source);
                BenchError::Execution {
                    prompt_id: prompt_id.to_string(),
                    source,
                }
            })?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let metrics = MetricsData::compute(response.total_tokens(), latency_ms, self.cost_per_token);
        info_log!(
            "Prompt '{}' scenario {} ({}): {}",
            prompt_id,
            scenario_id,
            model.model,
            metrics
        );

        Ok(ExecutionResult {
            prompt_id: prompt_id.to_string(),
            scenario_id,
            metrics,
            output: response.first_content().to_string(),
            variables: snapshot_values(values)?,
            completed_at: Utc::now(),
        })
    }

    /// Run every prompt of the configuration for one scenario, concurrently.
    /// Outcomes come back in prompt order.
    pub async fn run_scenario(
        &self,
        scenario_id: ScenarioId,
        values: &HashMap<String, String>,
        config: &Configuration,
        credentials: &Credentials,
    ) -> Vec<(String, Result<ExecutionResult>)> {
        let runs = config.prompts.iter().map(|prompt| async move {
            let outcome = self
                .run(&prompt.id, scenario_id, values, config, credentials)
                .await;
            (prompt.id.clone(), outcome)
        });
        join_all(runs).await
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("cost_per_token", &self.cost_per_token)
            .finish_non_exhaustive()
    }
}

/// Sorted-key JSON so identical inputs produce identical snapshots
fn snapshot_values(values: &HashMap<String, String>) -> Result<String> {
    let sorted: BTreeMap<&str, &str> = values
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    Ok(serde_json::to_string(&sorted)?)
}
