use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A certification exam offered in a state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CertTest {
    pub id: i64,
    pub state_id: i64,
    pub test_system: String,
    pub test_name: String,
    pub test_code: Option<String>,
    pub subject_area: String,
    pub grade_band: String,
    pub official_source_url: Option<String>,
    pub provider: String,
    /// Free-form date the source content was last updated (e.g. `"2024"`).
    pub source_last_updated: Option<String>,
    pub created_at: DateTime<Utc>,
}
