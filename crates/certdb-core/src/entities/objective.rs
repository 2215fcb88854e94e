use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ValidationStatus;

/// One learning/competency statement belonging to a certification test.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Objective {
    pub id: i64,
    pub test_id: i64,
    /// Zero-based position within the test, unique per test.
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
