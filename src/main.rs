use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod cli;
mod config;
mod core;
mod http_client;
mod tui;

use cli::commands::open_session;
use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load or create config
    let mut config = Config::load_or_create()?;

    match cli.command {
        Some(Commands::Config(args)) => {
            cli::commands::config::run(args, &mut config)?;
        }
        Some(Commands::Generate(args)) => {
            let mut session = open_session(&config)?;
            cli::commands::generate::run(args, &config, &mut session).await?;
        }
        Some(Commands::Sample(args)) if args.wants_list() => {
            cli::commands::sample::list_samples(&config)?;
        }
        Some(Commands::Sample(args)) => {
            let mut session = open_session(&config)?;
            cli::commands::sample::run(args, &config, &mut session).await?;
        }
        None => {
            // Launch TUI
            let session = open_session(&config)?;
            tui::run(&config, session).await?;
        }
    }

    Ok(())
}
