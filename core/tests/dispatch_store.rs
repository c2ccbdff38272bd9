use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use promptbench_core::config::{load, Configuration};
use promptbench_core::llm::{CompletionBoundary, CompletionRequest, CompletionResponse, Credentials, ProviderError};
use promptbench_core::store::{FileKeyValueStore, KeyValueStore, ResultStore, VariableValueMatrix};
use promptbench_core::{Dispatcher, MemoryKeyValueStore};

const YAML: &str = r#"
models:
  fast:
    provider: openai
    model: gpt-4o-mini
prompts:
  - id: summary
    name: Summary
    template: "Summarize {topic}"
    modelConfig: fast
    variables:
      - name: topic
        isMain: true
"#;

/// First call is slow, every later call is fast
struct SlowThenFast {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl CompletionBoundary for SlowThenFast {
    async fn complete(
        &self,
        _request: &CompletionRequest,
        _credentials: &Credentials,
    ) -> Result<CompletionResponse, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, label) = if call == 0 { (300, "slow") } else { (100, "fast") };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(CompletionResponse::new(10, label))
    }
}

async fn dispatch_and_store(
    dispatcher: &Dispatcher,
    store: &Mutex<ResultStore>,
    values: &HashMap<String, String>,
    config: &Configuration,
    credentials: &Credentials,
) {
    let result = dispatcher
        .run("summary", 0, values, config, credentials)
        .await
        .unwrap();
    store.lock().upsert(result).unwrap();
}

#[tokio::test(start_paused = true)]
async fn later_completion_overwrites_earlier() {
    let config = load(YAML).unwrap();
    let port: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
    let store = Mutex::new(ResultStore::new(port));
    let dispatcher = Dispatcher::new(
        Arc::new(SlowThenFast {
            calls: AtomicUsize::new(0),
        }),
        0.00002,
    );
    let values = HashMap::from([("topic".to_string(), "cats".to_string())]);
    let credentials = Credentials::new("sk-test");

    tokio::join!(
        dispatch_and_store(&dispatcher, &store, &values, &config, &credentials),
        dispatch_and_store(&dispatcher, &store, &values, &config, &credentials),
    );

    let store = store.lock();
    assert_eq!(store.len(), 1);
    let result = store.get("summary", 0).unwrap();
    assert_eq!(result.output, "slow");
    assert_eq!(result.metrics.latency, 300);
}

#[tokio::test]
async fn results_and_values_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = load(YAML).unwrap();
    let credentials = Credentials::new("sk-test");

    {
        let port: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(dir.path()));
        let mut matrix = VariableValueMatrix::load_from(port.clone());
        let mut results = ResultStore::load_from(port);
        let dispatcher = Dispatcher::new(
            Arc::new(SlowThenFast {
                calls: AtomicUsize::new(1),
            }),
            0.00002,
        );

        matrix.upsert("topic", 1, "tea").unwrap();
        let result = dispatcher
            .run("summary", 1, &matrix.scenario_values(1), &config, &credentials)
            .await
            .unwrap();
        results.upsert(result).unwrap();
    }

    let port: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(dir.path()));
    let matrix = VariableValueMatrix::load_from(port.clone());
    let results = ResultStore::load_from(port);

    assert_eq!(matrix.get("topic", 1), Some("tea"));
    let restored = results.get("summary", 1).unwrap();
    assert_eq!(restored.output, "fast");
    assert_eq!(restored.variables, r#"{"topic":"tea"}"#);
}
