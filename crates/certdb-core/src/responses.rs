//! Read-projection response types.
//!
//! These structs define the JSON returned by the `certdb` query subcommands
//! and by the HTTP API. All of them are computed from the store; none carry
//! invariants of their own.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::State;
use crate::records::{ObjectiveRecord, TestRecord};

/// One row of `list_states_with_counts`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct StateCounts {
    pub state: State,
    pub test_count: u32,
    pub objective_count: u32,
    pub verified_count: u32,
    pub inferred_count: u32,
    pub avg_confidence: f64,
}

/// Response for `/states/{name}/summary`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct StateSummary {
    pub state: String,
    pub abbreviation: String,
    pub total_tests: u32,
    pub total_objectives: u32,
    pub average_confidence: f64,
    /// Latest test creation timestamp (RFC 3339), empty when the state has no tests.
    pub last_updated: String,
}

/// Optional filters for objective search.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SearchFilters {
    pub state: Option<String>,
    pub subject: Option<String>,
    pub min_confidence: Option<f64>,
}

/// Matching objectives of a single test.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SearchHit {
    pub state: String,
    pub test: TestRecord,
    pub matching_objectives: Vec<ObjectiveRecord>,
    pub match_count: u32,
}

/// Response for `/search`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SearchResponse {
    pub query: String,
    pub filters: SearchFilters,
    pub total_results: u32,
    pub results: Vec<SearchHit>,
}

/// Confidence histogram: `> 0.8`, `0.5 ..= 0.8`, `< 0.5`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ConfidenceDistribution {
    pub high_confidence: u32,
    pub medium_confidence: u32,
    pub low_confidence: u32,
}

impl ConfidenceDistribution {
    /// Count one confidence score into its bucket.
    pub fn record(&mut self, confidence: f64) {
        if confidence > 0.8 {
            self.high_confidence += 1;
        } else if confidence >= 0.5 {
            self.medium_confidence += 1;
        } else {
            self.low_confidence += 1;
        }
    }

    #[must_use]
    pub fn from_scores(scores: impl IntoIterator<Item = f64>) -> Self {
        let mut dist = Self::default();
        for score in scores {
            dist.record(score);
        }
        dist
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.high_confidence + self.medium_confidence + self.low_confidence
    }
}

/// Response for `/stats/overview`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct OverviewStats {
    pub total_states: u32,
    pub total_tests: u32,
    pub total_objectives: u32,
    pub verified_objectives: u32,
    pub inferred_objectives: u32,
    pub average_confidence: f64,
    pub data_quality_distribution: ConfidenceDistribution,
}
