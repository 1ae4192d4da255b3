// src/main.rs
// logwatch - follow CSV datalogs as they are written

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use logwatch::config::LogwatchConfig;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env files (global first, then project - project overrides)
    let _ = dotenvy::from_path(LogwatchConfig::config_dir().join(".env"));
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = LogwatchConfig::resolve();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        config
            .logging
            .level
            .as_deref()
            .and_then(|level| level.parse::<Level>().ok())
            .unwrap_or(Level::INFO)
    };

    // Rows go to stdout, logs to stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Watch {
            file,
            interval_ms,
            latest,
            all_columns,
        } => {
            cli::run_watch(config, file, interval_ms, latest, all_columns).await?;
        }
        Commands::Columns { file } => {
            cli::run_columns(config, file).await?;
        }
        Commands::Show { names } => {
            cli::run_set_visibility(config, names, true)?;
        }
        Commands::Hide { names } => {
            cli::run_set_visibility(config, names, false)?;
        }
        Commands::Reset => {
            cli::run_reset(config)?;
        }
    }

    Ok(())
}
