use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

/// Handle `certdb stats`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let overview = ctx.db.overview().await?;
    output(&overview, flags.format)
}
