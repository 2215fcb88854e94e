//! Field sets for single-row inserts.
//!
//! Drafts carry everything an insert needs except the row id and the owning
//! foreign key, which the store assigns or receives separately.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{AuditStatus, ObjectivePath, ValidationStatus};

/// Fields for inserting a certification test.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewTest {
    pub test_system: String,
    pub test_name: String,
    pub test_code: Option<String>,
    pub subject_area: String,
    pub grade_band: String,
    pub official_source_url: Option<String>,
    pub provider: String,
    pub source_last_updated: Option<String>,
}

impl NewTest {
    /// Human-readable descriptor used in queries and log lines.
    #[must_use]
    pub fn descriptor(&self) -> String {
        match self.test_code.as_deref() {
            Some(code) if !code.is_empty() => {
                format!("{} {} ({code})", self.test_system, self.test_name)
            }
            _ => format!("{} {}", self.test_system, self.test_name),
        }
    }
}

/// Fields for inserting an objective.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NewObjective {
    pub index: u32,
    pub text: String,
    pub evidence_excerpt: Option<String>,
    pub evidence_url: Option<String>,
    pub evidence_locator: Option<String>,
    pub is_inferred: bool,
    pub confidence: f64,
    pub rationale: Option<String>,
    pub validation_status: ValidationStatus,
    pub validator_notes: Option<String>,
}

impl NewObjective {
    /// An objective produced by the fallback generator.
    #[must_use]
    pub fn inferred(index: u32, text: &str, confidence: f64, rationale: &str) -> Self {
        Self {
            index,
            text: text.to_string(),
            evidence_excerpt: None,
            evidence_url: None,
            evidence_locator: None,
            is_inferred: true,
            confidence,
            rationale: Some(rationale.to_string()),
            validation_status: ValidationStatus::Inferred,
            validator_notes: None,
        }
    }

    /// An objective extracted verbatim from a source document.
    #[must_use]
    pub fn discovered(index: u32, text: &str, evidence_url: Option<&str>) -> Self {
        Self {
            index,
            text: text.to_string(),
            evidence_excerpt: Some(text.chars().take(200).collect()),
            evidence_url: evidence_url.map(String::from),
            evidence_locator: None,
            is_inferred: false,
            confidence: 1.0,
            rationale: None,
            validation_status: ValidationStatus::Verified,
            validator_notes: None,
        }
    }
}

/// Fields for appending an audit record.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewAudit {
    pub status: AuditStatus,
    pub objective_path: ObjectivePath,
    pub tests_found: u32,
    pub objectives_found: u32,
    pub objectives_inferred: u32,
    pub queries_attempted: u32,
    pub run_started_at: DateTime<Utc>,
    pub run_ended_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_includes_code_when_present() {
        let mut test = NewTest {
            test_system: "Praxis".into(),
            test_name: "Mathematics: Content Knowledge".into(),
            test_code: Some("5161".into()),
            ..NewTest::default()
        };
        assert_eq!(
            test.descriptor(),
            "Praxis Mathematics: Content Knowledge (5161)"
        );
        test.test_code = Some(String::new());
        assert_eq!(test.descriptor(), "Praxis Mathematics: Content Knowledge");
    }

    #[test]
    fn discovered_excerpt_is_truncated() {
        let long = "Demonstrate ".repeat(40);
        let obj = NewObjective::discovered(0, &long, Some("https://www.ets.org/praxis"));
        assert_eq!(obj.evidence_excerpt.as_ref().map(|s| s.chars().count()), Some(200));
        assert!(!obj.is_inferred);
        assert_eq!(obj.validation_status, ValidationStatus::Verified);
    }
}
