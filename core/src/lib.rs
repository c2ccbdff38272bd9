pub mod config;
pub mod dispatch;
pub mod error;
pub mod llm;
pub mod logger;
pub mod result;
pub mod store;
pub mod template;
pub mod variables;

// Re-exports for convenience
pub use config::{Configuration, ConfigLoader, Settings};
pub use dispatch::Dispatcher;
pub use error::{BenchError, Result};
pub use llm::{CompletionBoundary, Credentials, OpenAiClient, ProviderError};
pub use result::{ExecutionResult, MetricsData, ScenarioId};
pub use store::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, ResultStore, VariableValueMatrix};
pub use variables::{aggregate, AggregatedVariable};
