use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pagefeed::app::AppContext;
use pagefeed::cli::{commands, Cli, Commands};
use pagefeed::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::with_workers(config, cli.workers);

    match cli.command {
        Commands::Run { accounts } => {
            commands::run(&ctx, &accounts).await?;
        }
        Commands::Render { accounts } => {
            commands::render(&ctx, &accounts).await?;
        }
        Commands::Scrape { name, url } => {
            commands::scrape(&ctx, &name, &url).await?;
        }
    }

    Ok(())
}
