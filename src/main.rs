use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::info;

use market_dash::{prepare, serve, AppState, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    info!("Loading market data from {}", cli.data.display());

    // Bad data means no server: the error chain is printed and we exit non-zero.
    let data = prepare(&cli.data)
        .with_context(|| format!("failed to load market data from {}", cli.data.display()))?;
    let state = Arc::new(AppState::new(data).context("failed to render dashboard page")?);

    serve(cli.socket_addr(), state)
        .await
        .context("dashboard server stopped")?;
    Ok(())
}
