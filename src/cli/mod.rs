// src/cli/mod.rs
// CLI module for logwatch commands

use clap::{Parser, Subcommand};
use logwatch::columns::{ColumnVisibilityStore, JsonFileBackend};
use logwatch::config::LogwatchConfig;
use std::path::PathBuf;

pub mod columns;
pub mod watch;

pub use columns::{run_columns, run_reset, run_set_visibility};
pub use watch::run_watch;

#[derive(Parser)]
#[command(name = "logwatch")]
#[command(about = "Live view of a CSV datalog as it is being written")]
#[command(version)]
pub struct Cli {
    /// Debug logging on stderr (overrides config and LOGWATCH_LOG_LEVEL)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Follow a datalog and print new rows
    Watch {
        /// CSV file to follow
        file: PathBuf,

        /// Poll interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Start from the newest row already in the file
        #[arg(long)]
        latest: bool,

        /// Ignore saved visibility and print every column
        #[arg(long)]
        all_columns: bool,
    },

    /// List the columns of a datalog and whether each is shown
    Columns {
        /// CSV file whose header to read
        file: PathBuf,
    },

    /// Show columns by name
    Show {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Hide columns by name
    Hide {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Forget all visibility settings
    Reset,
}

/// Visibility store backed by the configured JSON file
pub fn open_store(config: &LogwatchConfig) -> anyhow::Result<ColumnVisibilityStore> {
    let path = config.visibility_file();
    let store = ColumnVisibilityStore::load(JsonFileBackend::new(&path))
        .map_err(|e| anyhow::anyhow!("failed to load {}: {}", path.display(), e))?;
    Ok(store)
}
