//! Engine error types.

use thiserror::Error;

use certdb_core::errors::CoreError;
use certdb_db::error::DatabaseError;
use certdb_report::ReportError;

/// Failures that stop a run. Per-state persistence failures are recorded in
/// the state's audit and never surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
