use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{AuditStatus, ObjectivePath};

/// Bookkeeping for one state in one run. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Audit {
    pub id: i64,
    pub state_id: i64,
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
