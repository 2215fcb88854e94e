use std::sync::atomic::Ordering;

use anyhow::Context;
use certdb_api::ApiServer;

use crate::cli::root_commands::ServeArgs;
use crate::context::AppContext;

/// Handle `certdb serve`. Runs until Ctrl-C.
pub async fn handle(args: &ServeArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let server_config = &ctx.config.server;
    let bind = args.bind.as_deref().unwrap_or(&server_config.bind);
    let origin = args
        .origin
        .as_deref()
        .unwrap_or(&server_config.allowed_origin);

    let server = ApiServer::bind(bind, origin).context("failed to start HTTP API")?;
    if let Some(addr) = server.local_addr() {
        eprintln!("certdb API listening on http://{addr}");
    }

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    server.serve(&ctx.db).await.context("HTTP API failed")
}
