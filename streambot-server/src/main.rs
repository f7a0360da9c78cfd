use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use streambot_core::config::load_env_file;
use streambot_core::BotConfig;

mod context;
mod server;

#[derive(Parser, Debug, Clone)]
#[command(name = "streambot")]
#[command(author, version, about = "Stream Bot - pick a live stream from Discord and play it in voice")]
pub struct Args {
    /// Environment file to load before reading settings (defaults to ./.env if present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Do not (re)register the guild slash commands on connect
    #[arg(long, default_value = "false")]
    skip_command_registration: bool,

    /// Load the catalog once, log what was found, and exit
    #[arg(long, default_value = "false")]
    refresh_only: bool,
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("streambot=info".parse()?);
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let args = Args::parse();
    info!(
        "Stream Bot starting. skip_command_registration={}, refresh_only={}",
        args.skip_command_registration, args.refresh_only
    );

    load_env_file(args.env_file.as_deref())?;
    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return Err(e.into());
        }
    };

    server::run_server(args, config).await?;
    info!("Main finished. Goodbye!");
    Ok(())
}
