use anyhow::Context;
use certdb_report::Reporter;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

/// Handle `certdb report`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let progress = Progress::spinner("Writing reports");
    let files = match Reporter::new(&ctx.db, &ctx.config.paths).emit_all().await {
        Ok(files) => files,
        Err(error) => {
            progress.finish_err("report emission failed");
            return Err(error).context("failed to write reports");
        }
    };
    progress.finish_ok(&format!("{} state file(s) written", files.state_records.len()));
    output(&files, flags.format)
}
