//! Chronicler CLI binary.
//!
//! Creates projects, produces chapters and inspects the stored story.

use chronicler::{
    Chronicler, ChroniclerConfig, FileStoryRepository, ObservabilityConfig, ProjectLeases,
    Projects, init_observability,
};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, handle_next, handle_project_command};

    // Pick up GEMINI_API_KEY from .env when present
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ChroniclerConfig::from_file(path)?,
        None => ChroniclerConfig::load()?,
    };

    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.log.level.clone()
    };
    init_observability(&ObservabilityConfig::new(log_level).with_json_logs(config.log.json))?;

    let data_dir = config.resolve_data_dir(cli.data_dir.as_deref());

    match cli.command {
        Commands::Next { project, count } => {
            let app = Chronicler::gemini(&config, &data_dir)?;
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, stopping after the current step");
                    on_signal.cancel();
                }
            });
            handle_next(&app, &project, count, &cancel).await?;
        }

        command => {
            let repository = Arc::new(FileStoryRepository::new(&data_dir)?);
            let projects = Projects::new(repository, ProjectLeases::new());
            handle_project_command(command, &projects, &config.project).await?;
        }
    }

    Ok(())
}
