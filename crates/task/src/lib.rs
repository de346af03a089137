//! Test execution for conformer
//!
//! This crate runs one conformance test at a time: it decides whether the
//! test may be cached, transpiles it, races the execution agent against a
//! deadline and records the classified outcome.

pub mod agent;
pub mod orchestrator;
pub mod policy;
pub mod stats;
pub mod transpiler;

pub use agent::{AgentReport, EvalRequest, ExecutionAgent, ProcessAgent};
pub use orchestrator::TestRunner;
pub use policy::side_effect_token;
pub use stats::RunnerStats;
pub use tokio_util::sync::CancellationToken;
pub use transpiler::{
    CommandTranspiler, PassthroughTranspiler, TranspileError, TranspileOptions, Transpiler,
};
