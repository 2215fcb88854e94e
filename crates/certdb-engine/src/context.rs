//! Per-run state passed explicitly through the orchestrator.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use certdb_core::enums::{AuditStatus, ObjectivePath};

use crate::error::EngineError;
use crate::run_log::RunLog;

/// What happened to one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateOutcome {
    pub state: String,
    pub status: AuditStatus,
    pub objective_path: ObjectivePath,
    pub tests_found: u32,
    pub objectives_found: u32,
    pub objectives_inferred: u32,
    pub objectives_flagged: u32,
    pub queries_attempted: u32,
    pub error: Option<String>,
}

impl StateOutcome {
    /// An outcome with nothing recorded yet.
    #[must_use]
    pub fn new(state: &str) -> Self {
        Self {
            state: state.to_string(),
            status: AuditStatus::Partial,
            objective_path: ObjectivePath::None,
            tests_found: 0,
            objectives_found: 0,
            objectives_inferred: 0,
            objectives_flagged: 0,
            queries_attempted: 0,
            error: None,
        }
    }

    #[must_use]
    pub fn objectives(&self) -> u32 {
        self.objectives_found + self.objectives_inferred
    }
}

/// Totals across a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub states_processed: u32,
    pub failed_states: Vec<String>,
    pub total_tests: u32,
    pub total_objectives: u32,
    pub total_verified: u32,
    pub total_inferred: u32,
    pub total_flagged: u32,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &StateOutcome) {
        self.states_processed += 1;
        if outcome.status == AuditStatus::Failed {
            self.failed_states.push(outcome.state.clone());
            return;
        }
        self.total_tests += outcome.tests_found;
        self.total_objectives += outcome.objectives();
        self.total_verified += outcome.objectives_found;
        self.total_inferred += outcome.objectives_inferred;
        self.total_flagged += outcome.objectives_flagged;
    }

    #[must_use]
    pub fn verified_pct(&self) -> f64 {
        percentage(self.total_verified, self.total_objectives)
    }

    #[must_use]
    pub fn inferred_pct(&self) -> f64 {
        percentage(self.total_inferred, self.total_objectives)
    }
}

fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(whole) * 100.0
    }
}

/// Log files, counters and the start time of one pipeline run.
pub struct RunContext {
    pub log: RunLog,
    pub summary: RunSummary,
    pub outcomes: Vec<StateOutcome>,
    started_at: DateTime<Utc>,
}

impl RunContext {
    /// Open the run log under `logs_dir`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Io` if the log directory or file cannot be created.
    pub fn create(logs_dir: &Path) -> Result<Self, EngineError> {
        Ok(Self {
            log: RunLog::create(logs_dir)?,
            summary: RunSummary::default(),
            outcomes: Vec::new(),
            started_at: Utc::now(),
        })
    }

    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Fold a state's outcome into the totals and keep it.
    pub fn record(&mut self, outcome: StateOutcome) {
        self.summary.record(&outcome);
        self.outcomes.push(outcome);
    }
}
