use tracing::{error, info};

use streambot_core::platforms::PlatformIntegration;
use streambot_core::tasks::spawn_catalog_refresh_task;
use streambot_core::{BotConfig, Error};

use crate::context::ServerContext;
use crate::Args;

pub async fn run_server(args: Args, config: BotConfig) -> Result<(), Error> {
    let mut ctx = ServerContext::new(config, &args)?;

    // 1) Startup catalog load
    let summary = ctx.refresher.refresh().await;
    info!(
        "Catalog ready: {} streams (refreshed: {:?}, stale: {:?})",
        summary.total_entries, summary.refreshed, summary.kept_last_good
    );
    if args.refresh_only {
        for (name, locator) in ctx.catalog.snapshot().iter() {
            info!("  {name} => {locator}");
        }
        return Ok(());
    }

    // 2) Daily refresh
    let refresh_task = spawn_catalog_refresh_task(ctx.refresher.clone(), ctx.config.refresh);

    // 3) Discord gateway
    ctx.discord.connect().await?;
    info!("Stream Bot is online for guild {}", ctx.config.guild_id);

    // 4) Run until Ctrl-C
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Ctrl-C handler error: {:?}", e);
    }
    info!("Ctrl-C detected; shutting down...");

    refresh_task.abort();
    let open_sessions = ctx.stream_service.sessions().len();
    if open_sessions > 0 {
        info!("Dropping {open_sessions} open picker session(s)");
    }
    ctx.discord.disconnect().await?;
    Ok(())
}
