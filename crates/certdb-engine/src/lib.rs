//! # certdb-engine
//!
//! The objective pipeline: a [`Discovery`](discovery::Discovery) capability,
//! the quality [`validator`], the never-empty fallback generator in
//! [`inference`], and the [`Orchestrator`](orchestrator::Orchestrator) that
//! runs them state by state and persists the results.

pub mod context;
pub mod discovery;
pub mod error;
pub mod inference;
pub mod orchestrator;
pub mod run_log;
pub mod validator;

pub use context::{RunContext, RunSummary, StateOutcome};
pub use discovery::{Discovery, StubDiscovery};
pub use error::EngineError;
pub use orchestrator::Orchestrator;
