//! Cross-cutting error types for certdb.
//!
//! Domain-specific errors (`DatabaseError`, `EngineError`, `ReportError`) live
//! in their own crates. The binary converges them through `anyhow`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A pipeline phase transition was attempted that is not allowed.
    #[error("Invalid phase transition for {unit}: from {from} to {to}")]
    InvalidTransition {
        unit: String,
        from: String,
        to: String,
    },
}
