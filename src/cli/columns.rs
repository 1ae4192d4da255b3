// src/cli/columns.rs
// Column listing and visibility editing commands

use anyhow::{Context, Result};
use logwatch::config::LogwatchConfig;
use logwatch::csv::parse_header;
use logwatch::tail::read_header_line;
use std::path::PathBuf;

use super::open_store;

/// Print the schema of `file` with a visibility flag per column
pub async fn run_columns(config: LogwatchConfig, file: PathBuf) -> Result<()> {
    let header = tokio::task::spawn_blocking({
        let file = file.clone();
        move || read_header_line(&file)
    })
    .await??;
    let schema = parse_header(&header.text)
        .with_context(|| format!("reading header of {}", file.display()))?;

    let store = open_store(&config)?;
    for column in schema.iter() {
        let mark = if store.is_column_visible(column) { 'x' } else { ' ' };
        println!("[{}] {:>3}  {}", mark, column.index, column.label());
    }
    Ok(())
}

/// Show or hide the named columns
pub fn run_set_visibility(config: LogwatchConfig, names: Vec<String>, visible: bool) -> Result<()> {
    let store = open_store(&config)?;
    let changed = store.set_all(names.iter().map(String::as_str), visible)?;

    let verb = if visible { "shown" } else { "hidden" };
    println!(
        "{} column(s) {} ({} already {})",
        changed,
        verb,
        names.len() - changed,
        verb
    );
    Ok(())
}

/// Drop every saved setting
pub fn run_reset(config: LogwatchConfig) -> Result<()> {
    let store = open_store(&config)?;
    let hidden = store.snapshot().hidden().count();
    store.reset()?;
    println!("Visibility reset, {} hidden column(s) shown again", hidden);
    Ok(())
}
