use anyhow::anyhow;
use serde::Serialize;

use certdb_core::jurisdictions;
use certdb_core::records::{StateTestRecord, round2};
use certdb_core::responses::StateCounts;

use crate::cli::root_commands::StateArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::context::AppContext;
use crate::output::output;

/// Canonical stored name for user input: `tx` and ` texas ` both give `Texas`.
/// Unknown names are only trimmed.
pub fn canonical_state(input: &str) -> String {
    jurisdictions::lookup(input).map_or_else(|| input.trim().to_string(), |j| j.name.to_string())
}

#[derive(Debug, Serialize, PartialEq)]
struct StateRow {
    state: String,
    abbrev: String,
    tests: u32,
    objectives: u32,
    verified: u32,
    inferred: u32,
    avg_confidence: f64,
    last_refresh: Option<String>,
}

impl From<StateCounts> for StateRow {
    fn from(counts: StateCounts) -> Self {
        Self {
            state: counts.state.name,
            abbrev: counts.state.abbrev,
            tests: counts.test_count,
            objectives: counts.objective_count,
            verified: counts.verified_count,
            inferred: counts.inferred_count,
            avg_confidence: round2(counts.avg_confidence),
            last_refresh: counts.state.last_full_refresh.map(|at| at.to_rfc3339()),
        }
    }
}

/// One objective per row, for `--format table`.
#[derive(Debug, Serialize)]
struct ObjectiveRow<'a> {
    test: &'a str,
    index: u32,
    text: &'a str,
    confidence: f64,
    status: &'static str,
}

fn objective_rows(records: &[StateTestRecord]) -> Vec<ObjectiveRow<'_>> {
    records
        .iter()
        .flat_map(|record| {
            record.objectives.iter().map(|objective| ObjectiveRow {
                test: &record.test.test_name,
                index: objective.index,
                text: &objective.text,
                confidence: objective.confidence,
                status: objective.validation_status.as_str(),
            })
        })
        .collect()
}

/// Handle `certdb states`.
pub async fn handle_list(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut rows: Vec<StateRow> = ctx
        .db
        .list_states_with_counts()
        .await?
        .into_iter()
        .map(StateRow::from)
        .collect();
    if let Some(limit) = flags.limit {
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    }
    output(&rows, flags.format)
}

/// Handle `certdb state <name>`.
pub async fn handle_records(
    args: &StateArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let name = canonical_state(&args.name);
    let records = ctx
        .db
        .state_records_by_name(&name)
        .await?
        .ok_or_else(|| anyhow!("State {name} not found"))?;

    if flags.format == OutputFormat::Table {
        output(&objective_rows(&records), flags.format)
    } else {
        output(&records, flags.format)
    }
}

/// Handle `certdb summary <name>`.
pub async fn handle_summary(
    args: &StateArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let name = canonical_state(&args.name);
    let summary = ctx
        .db
        .state_summary(&name)
        .await?
        .ok_or_else(|| anyhow!("State {name} not found"))?;
    output(&summary, flags.format)
}

#[cfg(test)]
mod tests {
    use certdb_core::entities::State;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn canonicalizes_abbreviations_and_case() {
        assert_eq!(canonical_state("tx"), "Texas");
        assert_eq!(canonical_state("  new york "), "New York");
        assert_eq!(canonical_state(" Guam "), "Guam");
    }

    #[test]
    fn state_row_rounds_confidence() {
        let row = StateRow::from(StateCounts {
            state: State {
                id: 1,
                name: "Texas".into(),
                abbrev: "TX".into(),
                last_full_refresh: None,
            },
            test_count: 3,
            objective_count: 25,
            verified_count: 0,
            inferred_count: 25,
            avg_confidence: 0.683_333,
        });
        assert!((row.avg_confidence - 0.68).abs() < f64::EPSILON);
        assert_eq!(row.last_refresh, None);
        assert_eq!(row.objectives, 25);
    }
}
