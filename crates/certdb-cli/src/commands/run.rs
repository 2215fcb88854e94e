use anyhow::Context;
use chrono::Utc;
use serde::Serialize;

use certdb_config::RunConfig;
use certdb_engine::{Orchestrator, RunContext, RunSummary, StateOutcome, StubDiscovery};
use certdb_report::ReportFiles;

use crate::cli::root_commands::RunArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

#[derive(Debug, Serialize)]
struct RunReport {
    summary: RunSummary,
    states: Vec<StateOutcome>,
    reports: ReportFiles,
    elapsed_ms: i64,
}

/// Fold `--state`, `--all-states` and `--dedupe` into the run section.
fn apply_overrides(args: &RunArgs, run: &mut RunConfig) {
    if args.all_states {
        run.select_all_states();
    } else if !args.states.is_empty() {
        run.states = Some(args.states.clone());
    }
    if args.dedupe {
        run.dedupe_tests = true;
    }
}

/// Handle `certdb run`.
pub async fn handle(args: &RunArgs, ctx: &mut AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    apply_overrides(args, &mut ctx.config.run);
    let targets = ctx.config.run.resolve_states();
    tracing::info!(states = targets.len(), root = %ctx.config.paths.root.display(), "starting run");

    let mut run_ctx =
        RunContext::create(&ctx.config.paths.logs_dir()).context("failed to open run logs")?;
    let orchestrator = Orchestrator::new(&ctx.db, &ctx.config, StubDiscovery);

    let progress = Progress::spinner(&format!("Processing {} state(s)", targets.len()));
    let reports = match orchestrator.run_targets(&mut run_ctx, &targets).await {
        Ok(reports) => reports,
        Err(error) => {
            progress.finish_err("run failed");
            return Err(error).context("pipeline run failed");
        }
    };
    let summary = &run_ctx.summary;
    progress.finish_ok(&format!(
        "{} state(s), {} test(s), {} objective(s), {} failed",
        summary.states_processed,
        summary.total_tests,
        summary.total_objectives,
        summary.failed_states.len()
    ));

    let elapsed_ms = (Utc::now() - run_ctx.started_at()).num_milliseconds();
    if flags.format == OutputFormat::Table {
        return output(&run_ctx.outcomes, flags.format);
    }
    output(
        &RunReport {
            summary: run_ctx.summary,
            states: run_ctx.outcomes,
            reports,
            elapsed_ms,
        },
        flags.format,
    )
}
