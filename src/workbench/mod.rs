//! Workbench session
//!
//! The process-wide state a presentation layer drives: the loaded
//! configuration, the variable value matrix, the result store, in-flight
//! indicators and user-visible notices. Everything is behind short-lived
//! locks so one `Workbench` can be shared (`Arc<Workbench>`) between the UI
//! and any number of concurrent dispatches. No lock is held across a
//! provider call.

pub mod in_flight;
pub mod notices;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use promptbench_core::config::{ConfigLoader, Configuration, SchemaIssue, Settings};
use promptbench_core::llm::{CompletionBoundary, Credentials, OpenAiClient};
use promptbench_core::store::{FileKeyValueStore, KeyValueStore, ResultStore, VariableValueMatrix};
use promptbench_core::variables::{aggregate, AggregatedVariable};
use promptbench_core::{logger, BenchError, Dispatcher, ExecutionResult, Result, ScenarioId};

pub use in_flight::{InFlight, InFlightGuard};
pub use notices::{Notice, Notices};

pub struct Workbench {
    settings: Settings,
    loader: ConfigLoader,
    config: RwLock<Arc<Configuration>>,
    dispatcher: Dispatcher,
    results: Mutex<ResultStore>,
    matrix: Mutex<VariableValueMatrix>,
    in_flight: InFlight,
    notices: Notices,
}

impl Workbench {
    /// Open a session backed by files under `settings.data_dir`
    ///
    /// Fails when the configuration cannot be read or parsed. Schema
    /// problems in individual prompts or models only drop those entries and
    /// leave a notice.
    pub fn open(settings: Settings, boundary: Arc<dyn CompletionBoundary>) -> anyhow::Result<Self> {
        settings.validate().context("Invalid settings")?;
        std::fs::create_dir_all(&settings.data_dir).with_context(|| {
            format!("Failed to create data directory {}", settings.data_dir.display())
        })?;
        logger::init(settings.data_dir.clone());

        let port: Arc<dyn KeyValueStore> =
            Arc::new(FileKeyValueStore::new(settings.data_dir.join("state")));
        let loader = ConfigLoader::new(&settings.prompts_path);

        let workbench = Self::assemble(Configuration::default(), port, boundary, settings, loader);
        if let Err(e) = workbench.reload_configuration() {
            log::error!("[CONFIG] {}", e);
            return Err(anyhow::Error::new(e).context(format!(
                "Failed to load prompt configuration from {}",
                workbench.loader.path().display()
            )));
        }

        log::info!(
            "[WORKBENCH] Opened with {} prompts, {} stored results",
            workbench.configuration().prompts.len(),
            workbench.results.lock().len()
        );
        Ok(workbench)
    }

    /// Open a session that talks to the provider configured in `settings`
    pub fn open_with_provider(settings: Settings) -> anyhow::Result<Self> {
        let client = OpenAiClient::new(&settings.provider.base_url, settings.provider.timeout())
            .context("Failed to build provider client")?;
        Self::open(settings, Arc::new(client))
    }

    /// Assemble a session from already-loaded parts
    pub fn with_parts(
        config: Configuration,
        port: Arc<dyn KeyValueStore>,
        boundary: Arc<dyn CompletionBoundary>,
        settings: Settings,
    ) -> Self {
        let loader = ConfigLoader::new(&settings.prompts_path);
        Self::assemble(config, port, boundary, settings, loader)
    }

    fn assemble(
        config: Configuration,
        port: Arc<dyn KeyValueStore>,
        boundary: Arc<dyn CompletionBoundary>,
        settings: Settings,
        loader: ConfigLoader,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(boundary, settings.cost_per_token),
            results: Mutex::new(ResultStore::load_from(Arc::clone(&port))),
            matrix: Mutex::new(VariableValueMatrix::load_from(port)),
            config: RwLock::new(Arc::new(config)),
            in_flight: InFlight::new(),
            notices: Notices::new(),
            settings,
            loader,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Credentials from the environment variable named in the settings
    pub fn credentials_from_env(&self) -> Option<Credentials> {
        Credentials::from_env(&self.settings.provider.api_key_env)
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Snapshot of the current configuration
    pub fn configuration(&self) -> Arc<Configuration> {
        self.config.read().clone()
    }

    pub fn prompts_path(&self) -> &Path {
        self.loader.path()
    }

    /// Re-read the configuration file and swap it in
    ///
    /// Schema issues replace the previous configuration notices and are
    /// returned; a read or parse failure keeps the previous configuration.
    pub fn reload_configuration(&self) -> Result<Vec<SchemaIssue>> {
        let report = self.loader.load_with_report()?;
        self.notices.clear_configuration_scoped();
        for issue in &report.issues {
            log::warn!("[CONFIG] {}", issue.clone().into_error());
            self.notices.push(
                issue.prompt_id.as_deref(),
                None,
                issue.clone().into_error().to_string(),
            );
        }
        self.replace_configuration(report.configuration);
        Ok(report.issues)
    }

    /// Swap in a new configuration; dispatches already running keep theirs
    pub fn replace_configuration(&self, config: Configuration) {
        log::info!("[CONFIG] Loaded {} prompts, {} models", config.prompts.len(), config.models.len());
        *self.config.write() = Arc::new(config);
    }

    // =========================================================================
    // Variables
    // =========================================================================

    /// Input fields for the current configuration
    pub fn variables(&self) -> Vec<AggregatedVariable> {
        aggregate(&self.configuration())
    }

    pub fn set_variable(&self, name: &str, scenario_id: ScenarioId, value: impl Into<String>) -> Result<()> {
        self.check_scenario(scenario_id)?;
        self.matrix.lock().upsert(name, scenario_id, value)
    }

    pub fn variable(&self, name: &str, scenario_id: ScenarioId) -> Option<String> {
        self.matrix.lock().get(name, scenario_id).map(str::to_string)
    }

    /// Interpolation values for one scenario: entered values over defaults
    pub fn scenario_values(&self, scenario_id: ScenarioId) -> HashMap<String, String> {
        let mut values: HashMap<String, String> = self
            .variables()
            .into_iter()
            .filter_map(|v| v.default.map(|d| (v.name, d.to_string())))
            .collect();
        values.extend(self.matrix.lock().scenario_values(scenario_id));
        values
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Run one prompt for one scenario and record the outcome
    ///
    /// Success replaces the stored result for the key. Failure leaves the
    /// store untouched and adds a notice. Duplicate triggers are not
    /// coalesced; whichever completes last is kept.
    pub async fn trigger(
        &self,
        prompt_id: &str,
        scenario_id: ScenarioId,
        credentials: &Credentials,
    ) -> Result<ExecutionResult> {
        self.check_scenario(scenario_id)?;

        let config = self.configuration();
        let values = self.scenario_values(scenario_id);
        let _running = self.in_flight.begin(prompt_id, scenario_id);

        match self
            .dispatcher
            .run(prompt_id, scenario_id, &values, &config, credentials)
            .await
        {
            Ok(result) => {
                log::info!(
                    "[DISPATCH] {} / scenario {}: {}",
                    prompt_id,
                    scenario_id,
                    result.metrics
                );
                if let Err(e) = self.results.lock().upsert(result.clone()) {
                    log::error!("[STORE] Failed to persist results: {}", e);
                    self.notices
                        .push(Some(prompt_id), Some(scenario_id), e.user_message());
                }
                Ok(result)
            }
            Err(e) => {
                log::error!("[DISPATCH] {} / scenario {} failed: {}", prompt_id, scenario_id, e);
                self.notices
                    .push(Some(prompt_id), Some(scenario_id), e.user_message());
                Err(e)
            }
        }
    }

    /// Run every prompt for one scenario concurrently, in prompt order
    pub async fn trigger_scenario(
        &self,
        scenario_id: ScenarioId,
        credentials: &Credentials,
    ) -> Result<Vec<(String, Result<ExecutionResult>)>> {
        self.check_scenario(scenario_id)?;

        let config = self.configuration();
        let runs = config.prompts.iter().map(|prompt| async move {
            let outcome = self.trigger(&prompt.id, scenario_id, credentials).await;
            (prompt.id.clone(), outcome)
        });
        Ok(join_all(runs).await)
    }

    pub fn is_running(&self, prompt_id: &str, scenario_id: ScenarioId) -> bool {
        self.in_flight.is_running(prompt_id, scenario_id)
    }

    pub fn running(&self) -> Vec<(String, ScenarioId)> {
        self.in_flight.running()
    }

    // =========================================================================
    // Results and notices
    // =========================================================================

    pub fn result(&self, prompt_id: &str, scenario_id: ScenarioId) -> Option<ExecutionResult> {
        self.results.lock().get(prompt_id, scenario_id).cloned()
    }

    /// Every stored result, in first-seen key order
    pub fn results(&self) -> Vec<ExecutionResult> {
        self.results.lock().entries().to_vec()
    }

    pub fn results_for_prompt(&self, prompt_id: &str) -> Vec<ExecutionResult> {
        self.results.lock().for_prompt(prompt_id).cloned().collect()
    }

    pub fn clear_results(&self) -> Result<()> {
        self.results.lock().clear()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.list()
    }

    pub fn dismiss(&self, id: Uuid) -> bool {
        self.notices.dismiss(id)
    }

    pub fn dismiss_all(&self) {
        self.notices.clear();
    }

    fn check_scenario(&self, scenario_id: ScenarioId) -> Result<()> {
        if scenario_id < self.settings.scenario_count {
            Ok(())
        } else {
            Err(BenchError::InvalidScenario {
                scenario: scenario_id,
                count: self.settings.scenario_count,
            })
        }
    }
}

impl std::fmt::Debug for Workbench {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbench")
            .field("prompts_path", &self.loader.path())
            .field("scenario_count", &self.settings.scenario_count)
            .field("running", &self.in_flight.running())
            .finish_non_exhaustive()
    }
}
