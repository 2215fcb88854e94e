//! Status enums, inference strategies, and the per-state pipeline phase machine.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! and expose `as_str()` for SQL storage. `PipelinePhase` provides
//! `allowed_next_states()` so the orchestrator can refuse illegal transitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ValidationStatus
// ---------------------------------------------------------------------------

/// Quality verdict attached to every persisted objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Found in an authoritative source and passed every check.
    Verified,
    /// Produced by the fallback generator and passed every check.
    Inferred,
    /// At least one validator issue; see validator notes.
    Flagged,
    Rejected,
}

impl ValidationStatus {
    /// Return the string representation used in SQL storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Inferred => "inferred",
            Self::Flagged => "flagged",
            Self::Rejected => "rejected",
        }
    }

    /// Status for an objective given its origin and whether the validator
    /// reported any issues.
    #[must_use]
    pub const fn from_checks(is_inferred: bool, has_issues: bool) -> Self {
        match (has_issues, is_inferred) {
            (true, _) => Self::Flagged,
            (false, true) => Self::Inferred,
            (false, false) => Self::Verified,
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditStatus
// ---------------------------------------------------------------------------

/// Outcome of processing one state in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Success,
    Partial,
    Failed,
}

impl AuditStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ObjectivePath
// ---------------------------------------------------------------------------

/// Which pipeline branch produced the objectives persisted for a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ObjectivePath {
    Discovered,
    Inferred,
    /// Some tests used discovered objectives, others fell back to inference.
    Mixed,
    /// No objectives were persisted.
    None,
}

impl ObjectivePath {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Inferred => "inferred",
            Self::Mixed => "mixed",
            Self::None => "none",
        }
    }

    /// Fold the path of one more test into the state-level path.
    #[must_use]
    pub const fn combine(self, next: Self) -> Self {
        match (self, next) {
            (Self::None, other) | (other, Self::None) => other,
            (Self::Discovered, Self::Discovered) => Self::Discovered,
            (Self::Inferred, Self::Inferred) => Self::Inferred,
            _ => Self::Mixed,
        }
    }
}

impl fmt::Display for ObjectivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// InferenceStrategy
// ---------------------------------------------------------------------------

/// The four fallback strategies, in priority order.
///
/// ```text
/// subject_template → national_standards → test_system_pattern → minimal_fallback
///       0.75                0.70                  0.60                 0.40
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum InferenceStrategy {
    SubjectTemplate,
    NationalStandards,
    TestSystemPattern,
    MinimalFallback,
}

impl InferenceStrategy {
    /// All strategies in the order the cascade tries them.
    pub const PRIORITY: [Self; 4] = [
        Self::SubjectTemplate,
        Self::NationalStandards,
        Self::TestSystemPattern,
        Self::MinimalFallback,
    ];

    /// Fixed confidence assigned to every objective the strategy produces.
    #[must_use]
    pub const fn confidence(self) -> f64 {
        match self {
            Self::SubjectTemplate => 0.75,
            Self::NationalStandards => 0.70,
            Self::TestSystemPattern => 0.60,
            Self::MinimalFallback => 0.40,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SubjectTemplate => "subject_template",
            Self::NationalStandards => "national_standards",
            Self::TestSystemPattern => "test_system_pattern",
            Self::MinimalFallback => "minimal_fallback",
        }
    }
}

impl fmt::Display for InferenceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PipelinePhase
// ---------------------------------------------------------------------------

/// Phase of a single state unit inside the orchestrator.
///
/// ```text
/// pending → discovering → validating → persisting → done
///                       ↘ inferring  ↗
///           validating → inferring (nothing passed validation)
/// any non-terminal phase → failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Pending,
    Discovering,
    Validating,
    Inferring,
    Persisting,
    Done,
    Failed,
}

impl PipelinePhase {
    /// Valid next phases from the current phase.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Discovering, Self::Failed],
            Self::Discovering => &[Self::Validating, Self::Inferring, Self::Failed],
            Self::Validating => &[Self::Inferring, Self::Persisting, Self::Failed],
            Self::Inferring => &[Self::Persisting, Self::Failed],
            Self::Persisting => &[Self::Done, Self::Failed],
            Self::Done | Self::Failed => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Discovering => "discovering",
            Self::Validating => "validating",
            Self::Inferring => "inferring",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn validation_status_from_checks() {
        assert_eq!(
            ValidationStatus::from_checks(true, false),
            ValidationStatus::Inferred
        );
        assert_eq!(
            ValidationStatus::from_checks(false, false),
            ValidationStatus::Verified
        );
        assert_eq!(
            ValidationStatus::from_checks(true, true),
            ValidationStatus::Flagged
        );
        assert_eq!(
            ValidationStatus::from_checks(false, true),
            ValidationStatus::Flagged
        );
    }

    #[test]
    fn strategy_priority_is_descending_confidence() {
        let confidences: Vec<f64> = InferenceStrategy::PRIORITY
            .iter()
            .map(|s| s.confidence())
            .collect();
        assert_eq!(confidences, vec![0.75, 0.70, 0.60, 0.40]);
    }

    #[test]
    fn objective_path_combine() {
        use ObjectivePath::*;
        assert_eq!(None.combine(Inferred), Inferred);
        assert_eq!(Inferred.combine(None), Inferred);
        assert_eq!(Inferred.combine(Inferred), Inferred);
        assert_eq!(Discovered.combine(Inferred), Mixed);
        assert_eq!(Mixed.combine(Discovered), Mixed);
        assert_eq!(None.combine(None), None);
    }

    #[test]
    fn phase_machine_happy_paths() {
        use PipelinePhase::*;
        assert!(Pending.can_transition_to(Discovering));
        assert!(Discovering.can_transition_to(Inferring));
        assert!(Discovering.can_transition_to(Validating));
        assert!(Validating.can_transition_to(Persisting));
        assert!(Validating.can_transition_to(Inferring));
        assert!(Inferring.can_transition_to(Persisting));
        assert!(Persisting.can_transition_to(Done));
    }

    #[test]
    fn phase_machine_rejects_skips_and_terminal_exits() {
        use PipelinePhase::*;
        assert!(!Pending.can_transition_to(Persisting));
        assert!(!Inferring.can_transition_to(Validating));
        assert!(Done.allowed_next_states().is_empty());
        assert!(Failed.allowed_next_states().is_empty());
        for phase in [Pending, Discovering, Validating, Inferring, Persisting] {
            assert!(phase.can_transition_to(Failed), "{phase} should reach failed");
            assert!(!phase.is_terminal());
        }
    }

    #[test]
    fn as_str_matches_serde() {
        let json = serde_json::to_string(&PipelinePhase::Discovering).unwrap();
        assert_eq!(json, "\"discovering\"");
        let json = serde_json::to_string(&InferenceStrategy::TestSystemPattern).unwrap();
        assert_eq!(json, format!("\"{}\"", InferenceStrategy::TestSystemPattern));
        let json = serde_json::to_string(&AuditStatus::Partial).unwrap();
        assert_eq!(json, "\"partial\"");
    }
}
