//! Exported record shapes.
//!
//! `StateTestRecord` is one line of `data/<State>.jsonl` and one element of
//! the `/states/{name}` HTTP response. The aggregate JSON export nests the
//! same test and objective shapes under each state.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{CertTest, Objective};
use crate::enums::ValidationStatus;

/// Test metadata as exported.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TestRecord {
    pub test_name: String,
    pub test_code: Option<String>,
    pub test_system: String,
    pub subject_area: String,
    pub grade_band: String,
    pub provider: String,
    pub official_source_url: Option<String>,
    pub source_last_updated: Option<String>,
    /// RFC 3339 creation timestamp of the test row.
    pub scraped_at: String,
}

impl From<&CertTest> for TestRecord {
    fn from(test: &CertTest) -> Self {
        Self {
            test_name: test.test_name.clone(),
            test_code: test.test_code.clone(),
            test_system: test.test_system.clone(),
            subject_area: test.subject_area.clone(),
            grade_band: test.grade_band.clone(),
            provider: test.provider.clone(),
            official_source_url: test.official_source_url.clone(),
            source_last_updated: test.source_last_updated.clone(),
            scraped_at: test.created_at.to_rfc3339(),
        }
    }
}

/// Objective as exported.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ObjectiveRecord {
    pub index: u32,
    pub text: String,
    pub evidence_url: Option<String>,
    pub is_inferred: bool,
    pub confidence: f64,
    pub rationale: Option<String>,
    pub validation_status: ValidationStatus,
    pub validator_notes: Option<String>,
}

impl From<&Objective> for ObjectiveRecord {
    fn from(obj: &Objective) -> Self {
        Self {
            index: obj.index,
            text: obj.text.clone(),
            evidence_url: obj.evidence_url.clone(),
            is_inferred: obj.is_inferred,
            confidence: obj.confidence,
            rationale: obj.rationale.clone(),
            validation_status: obj.validation_status,
            validator_notes: obj.validator_notes.clone(),
        }
    }
}

/// One test of one state together with its ordered objectives.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct StateTestRecord {
    pub state: String,
    pub test: TestRecord,
    pub objectives: Vec<ObjectiveRecord>,
}

impl StateTestRecord {
    #[must_use]
    pub fn new(state: &str, test: &CertTest, objectives: &[Objective]) -> Self {
        Self {
            state: state.to_string(),
            test: TestRecord::from(test),
            objectives: objectives.iter().map(ObjectiveRecord::from).collect(),
        }
    }

    /// Mean confidence across the record's objectives, `0.0` when empty.
    #[must_use]
    pub fn avg_confidence(&self) -> f64 {
        mean(self.objectives.iter().map(|o| o.confidence))
    }
}

/// Arithmetic mean that yields `0.0` for an empty sequence.
#[must_use]
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

/// Round to two decimal places, as every exported average is.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
