//! `promptbench` - compare prompt variants side by side
//!
//! Load a document of prompt templates and model settings, fill shared
//! variables per scenario, dispatch each (prompt, scenario) pair to a
//! chat-completion provider and keep the latest output with its token,
//! latency and cost metrics. The engine lives in `promptbench-core`; this
//! crate is the session a presentation layer drives.

pub mod workbench;

pub use promptbench_core::config::Settings;
pub use promptbench_core::llm::{CompletionBoundary, Credentials};
pub use promptbench_core::{BenchError, ExecutionResult, MetricsData, ScenarioId};
pub use workbench::{Notice, Workbench};
