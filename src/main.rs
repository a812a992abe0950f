use anyhow::Result;
use clap::Parser;
use immich_tools::api::ImmichApi;
use immich_tools::autostack;
use immich_tools::cli::{Cli, Command};
use immich_tools::clients::immich::ImmichClient;
use immich_tools::config::AppConfig;
use immich_tools::progress::{ConsoleProgress, Progress};
use log::info;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.overrides())?;

    // Initialize env_logger based on config.log_level
    env_logger::Builder::new()
        .filter_level(config.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    config.validate()?;
    info!("Starting immich-tools against {}", config.host);

    let api: Arc<dyn ImmichApi> = Arc::new(ImmichClient::new(&config)?);
    let console = Arc::new(ConsoleProgress::new());
    let progress: Arc<dyn Progress> = console.clone();

    match &cli.command {
        Command::Autostack { directory, .. } => {
            let summary = autostack::run(&config, api, progress, directory).await;
            console.finish();
            let summary = summary?;
            info!(
                "Autostack finished: {} stacks planned, {} created, {} metadata updates",
                summary.stacks, summary.stacks_created, summary.metadata_updates
            );
        }
    }

    Ok(())
}
