use serde::Serialize;

use certdb_core::responses::{SearchFilters, SearchResponse};

use crate::cli::root_commands::SearchArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::commands::states::canonical_state;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct MatchRow<'a> {
    state: &'a str,
    test: &'a str,
    index: u32,
    text: &'a str,
    confidence: f64,
}

fn match_rows(response: &SearchResponse) -> Vec<MatchRow<'_>> {
    response
        .results
        .iter()
        .flat_map(|hit| {
            hit.matching_objectives.iter().map(|objective| MatchRow {
                state: &hit.state,
                test: &hit.test.test_name,
                index: objective.index,
                text: &objective.text,
                confidence: objective.confidence,
            })
        })
        .collect()
}

/// Handle `certdb search`.
pub async fn handle(args: &SearchArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let filters = SearchFilters {
        state: args.state.as_deref().map(canonical_state),
        subject: args.subject.clone(),
        min_confidence: args.min_confidence,
    };
    let mut response = ctx.db.search(&args.query, &filters).await?;
    if let Some(limit) = flags.limit {
        response
            .results
            .truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    }

    if flags.format == OutputFormat::Table {
        output(&match_rows(&response), flags.format)
    } else {
        output(&response, flags.format)
    }
}
