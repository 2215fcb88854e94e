use serde::Serialize;

use certdb_core::drafts::NewObjective;
use certdb_core::enums::{InferenceStrategy, ValidationStatus};
use certdb_engine::validator::{ObjectiveIssue, apply_validation, clean_text};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ValidateArgs;
use crate::output::output;

#[derive(Debug, Serialize, PartialEq)]
struct ValidationReport {
    input: String,
    cleaned: String,
    is_inferred: bool,
    issues: Vec<ObjectiveIssue>,
    validation_status: ValidationStatus,
    validator_notes: Option<String>,
}

/// Clean and validate one statement the way the pipeline would. Supplying a
/// rationale or confidence validates it as an inferred objective.
fn check(args: &ValidateArgs) -> ValidationReport {
    let cleaned = clean_text(&args.text);
    let is_inferred = args.rationale.is_some() || args.confidence.is_some();
    let mut draft = if is_inferred {
        NewObjective::inferred(
            0,
            &cleaned,
            args.confidence
                .unwrap_or_else(|| InferenceStrategy::MinimalFallback.confidence()),
            args.rationale.as_deref().unwrap_or(""),
        )
    } else {
        NewObjective::discovered(0, &cleaned, None)
    };
    let issues = apply_validation(&mut draft);

    ValidationReport {
        input: args.text.clone(),
        cleaned,
        is_inferred,
        issues,
        validation_status: draft.validation_status,
        validator_notes: draft.validator_notes,
    }
}

/// Handle `certdb validate`.
pub fn handle(args: &ValidateArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    output(&check(args), flags.format)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn args(text: &str, rationale: Option<&str>, confidence: Option<f64>) -> ValidateArgs {
        ValidateArgs {
            text: text.into(),
            rationale: rationale.map(String::from),
            confidence,
        }
    }

    #[test]
    fn clean_statement_stays_verified() {
        let report = check(&args(
            "Demonstrate knowledge of child development and learning theory",
            None,
            None,
        ));
        assert!(report.issues.is_empty());
        assert_eq!(report.validation_status, ValidationStatus::Verified);
        assert_eq!(report.validator_notes, None);
    }

    #[test]
    fn short_statement_is_flagged_with_notes() {
        let report = check(&args("Home", None, None));
        assert_eq!(
            report.issues,
            vec![ObjectiveIssue::TooShort, ObjectiveIssue::MissingActionVerb]
        );
        assert_eq!(report.validation_status, ValidationStatus::Flagged);
        assert_eq!(
            report.validator_notes.as_deref(),
            Some("too short; missing action verb")
        );
    }

    #[test]
    fn inferred_statement_needs_rationale_and_range() {
        let report = check(&args(
            "Apply mathematical reasoning and problem-solving strategies",
            Some("  "),
            Some(1.4),
        ));
        assert!(report.is_inferred);
        assert_eq!(
            report.issues,
            vec![
                ObjectiveIssue::MissingRationale,
                ObjectiveIssue::ConfidenceOutOfRange
            ]
        );
    }
}
