use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(
    command: Commands,
    ctx: &mut AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Run(args) => commands::run::handle(&args, ctx, flags).await,
        Commands::Report => commands::report::handle(ctx, flags).await,
        Commands::States => commands::states::handle_list(ctx, flags).await,
        Commands::State(args) => commands::states::handle_records(&args, ctx, flags).await,
        Commands::Summary(args) => commands::states::handle_summary(&args, ctx, flags).await,
        Commands::Search(args) => commands::search::handle(&args, ctx, flags).await,
        Commands::Stats => commands::stats::handle(ctx, flags).await,
        Commands::Serve(args) => commands::serve::handle(&args, ctx).await,
        Commands::Schema(_)
        | Commands::Validate(_)
        | Commands::Generate(_)
        | Commands::Config => {
            unreachable!("schema/validate/generate/config are pre-dispatched in main")
        }
    }
}
