//! Cross-state exports: the nested JSON document and the two summary CSVs.

use std::collections::BTreeMap;

use serde::Serialize;

use certdb_core::entities::State;
use certdb_core::records::{ObjectiveRecord, StateTestRecord, TestRecord};
use certdb_core::responses::StateCounts;

use crate::csv::{CsvDocument, fixed2};

pub const AGGREGATE_CSV_HEADER: [&str; 6] = [
    "state",
    "test_name",
    "test_code",
    "subject_area",
    "objective_count",
    "avg_confidence",
];

pub const VALIDATION_CSV_HEADER: [&str; 7] = [
    "state",
    "tests",
    "objectives",
    "verified_count",
    "inferred_count",
    "avg_confidence",
    "status",
];

#[derive(Debug, Serialize)]
pub struct StateInfo {
    pub name: String,
    pub abbrev: String,
    pub last_refresh: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AggregateTest {
    #[serde(flatten)]
    pub test: TestRecord,
    pub objectives_count: usize,
    pub objectives: Vec<ObjectiveRecord>,
}

#[derive(Debug, Serialize)]
pub struct AggregateState {
    pub state_info: StateInfo,
    pub tests: Vec<AggregateTest>,
}

/// Nest every state's tests and objectives under the state name.
#[must_use]
pub fn build_document(states: Vec<(State, Vec<StateTestRecord>)>) -> BTreeMap<String, AggregateState> {
    states
        .into_iter()
        .map(|(state, records)| {
            let tests = records
                .into_iter()
                .map(|record| AggregateTest {
                    test: record.test,
                    objectives_count: record.objectives.len(),
                    objectives: record.objectives,
                })
                .collect();
            let info = StateInfo {
                last_refresh: state.last_full_refresh.map(|ts| ts.to_rfc3339()),
                abbrev: state.abbrev,
                name: state.name.clone(),
            };
            (
                state.name,
                AggregateState {
                    state_info: info,
                    tests,
                },
            )
        })
        .collect()
}

/// One row per test.
#[must_use]
pub fn render_tests_csv<'a>(records: impl IntoIterator<Item = &'a StateTestRecord>) -> String {
    let mut doc = CsvDocument::new(&AGGREGATE_CSV_HEADER);
    for record in records {
        doc.row([
            record.state.clone(),
            record.test.test_name.clone(),
            record.test.test_code.clone().unwrap_or_else(|| "N/A".into()),
            record.test.subject_area.clone(),
            record.objectives.len().to_string(),
            fixed2(record.avg_confidence()),
        ]);
    }
    doc.into_string()
}

/// `Complete` with objectives, `Partial` without, `Mostly Inferred` when
/// inferred objectives outnumber verified ones.
#[must_use]
pub fn validation_status(counts: &StateCounts) -> &'static str {
    if counts.inferred_count > counts.verified_count {
        "Mostly Inferred"
    } else if counts.objective_count > 0 {
        "Complete"
    } else {
        "Partial"
    }
}

/// One row per state.
#[must_use]
pub fn render_validation_csv(states: &[StateCounts]) -> String {
    let mut doc = CsvDocument::new(&VALIDATION_CSV_HEADER);
    for counts in states {
        doc.row([
            counts.state.name.clone(),
            counts.test_count.to_string(),
            counts.objective_count.to_string(),
            counts.verified_count.to_string(),
            counts.inferred_count.to_string(),
            fixed2(counts.avg_confidence),
            validation_status(counts).to_string(),
        ]);
    }
    doc.into_string()
}
