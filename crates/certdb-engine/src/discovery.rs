//! Discovery capability.
//!
//! Implementations look for official test listings and objective text for a
//! state's test. The contract is empty-on-failure: a failed or partial
//! search returns whatever it has (possibly nothing) and never an error.

use std::future::Future;

use serde::Serialize;

use certdb_core::drafts::NewTest;

/// An objective statement found in a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredObjective {
    pub text: String,
    pub source_url: Option<String>,
    pub locator: Option<String>,
}

impl DiscoveredObjective {
    #[must_use]
    pub fn new(text: impl Into<String>, source_url: Option<&str>) -> Self {
        Self {
            text: text.into(),
            source_url: source_url.map(String::from),
            locator: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryResult {
    /// Additional tests found for the state.
    pub candidate_tests: Vec<NewTest>,
    /// Objective statements for the requested test, in document order.
    pub candidate_objectives: Vec<DiscoveredObjective>,
    /// URLs that mention the test without yielding objectives.
    pub supporting_sources: Vec<String>,
    pub queries_attempted: u32,
}

impl DiscoveryResult {
    #[must_use]
    pub fn empty(queries_attempted: u32) -> Self {
        Self {
            queries_attempted,
            ..Self::default()
        }
    }
}

pub trait Discovery: Send + Sync {
    /// Search for `test` in `state`. Must not fail; return an empty result
    /// when nothing usable is found.
    fn discover(&self, state: &str, test: &NewTest) -> impl Future<Output = DiscoveryResult> + Send;
}

/// Query strings tried for one test of one state.
#[must_use]
pub fn build_queries(state: &str, test: &NewTest) -> Vec<String> {
    let descriptor = test.descriptor();
    vec![
        format!("{state} {descriptor} test objectives site:.gov"),
        format!("{state} {descriptor} test framework competencies"),
        format!("{descriptor} study companion objectives"),
        format!("{descriptor} test blueprint site:.edu"),
        format!("{state} {} teacher certification requirements", test.test_system),
        format!("{state} department of education teacher licensing exams"),
    ]
}

/// Offline discovery: builds the query set and returns no candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubDiscovery;

impl Discovery for StubDiscovery {
    async fn discover(&self, state: &str, test: &NewTest) -> DiscoveryResult {
        let queries = build_queries(state, test);
        for query in &queries {
            tracing::debug!(state, query = query.as_str(), "discovery query (offline)");
        }
        DiscoveryResult::empty(u32::try_from(queries.len()).unwrap_or(u32::MAX))
    }
}
