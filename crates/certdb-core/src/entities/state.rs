use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A U.S. jurisdiction that issues teaching certificates.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct State {
    pub id: i64,
    pub name: String,
    pub abbrev: String,
    pub last_full_refresh: Option<DateTime<Utc>>,
}
