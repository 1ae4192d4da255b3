// src/cli/watch.rs
// Follow a datalog and print rows as they arrive

use anyhow::Result;
use logwatch::columns::ColumnVisibilityStore;
use logwatch::config::{LogwatchConfig, StartPosition};
use logwatch::csv::{Row, Schema};
use logwatch::watcher::{Coordinator, WatchEvent};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::open_store;

/// Run the watch command until the file goes away or Ctrl-C
pub async fn run_watch(
    config: LogwatchConfig,
    file: PathBuf,
    interval_ms: Option<u64>,
    latest: bool,
    all_columns: bool,
) -> Result<()> {
    let mut watch = config.watch.clone();
    if let Some(ms) = interval_ms {
        watch.poll_interval_ms = ms;
    }
    if latest {
        watch.start_position = StartPosition::LatestRow;
    }

    let store = if all_columns {
        ColumnVisibilityStore::in_memory()
    } else {
        open_store(&config)?
    };

    let coordinator = Coordinator::new(watch);
    let mut handle = coordinator.start(&file).await?;
    print_columns(&store, &handle.schema())?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break Ok(());
            }
            event = handle.recv() => match event {
                Some(WatchEvent::Row(row)) => print_row(&store, &row)?,
                Some(WatchEvent::MalformedRow(e)) => {
                    warn!(expected = e.expected, actual = e.actual, line = %e.raw_line, "Skipping malformed row");
                }
                Some(WatchEvent::Rotation(schema)) => {
                    info!(file = %file.display(), columns = schema.len(), "File rotated, new header");
                    print_columns(&store, &schema)?;
                }
                Some(WatchEvent::Fatal(e)) => break Err(e.into()),
                None => break Ok(()),
            },
        }
    };

    coordinator.stop(&mut handle).await;

    let stats = handle.stats();
    debug!(
        polls = stats.polls,
        rows = stats.rows,
        malformed = stats.malformed_rows,
        rotations = stats.rotations,
        transient_errors = stats.transient_errors,
        "Session summary"
    );

    outcome
}

fn print_columns(store: &ColumnVisibilityStore, schema: &Schema) -> Result<()> {
    let labels: Vec<String> = store
        .visible_columns(schema)
        .into_iter()
        .map(|column| column.label())
        .collect();
    let hidden = schema.len() - labels.len();

    let mut out = std::io::stdout().lock();
    if hidden > 0 {
        writeln!(out, "# {} ({} hidden)", labels.join(", "), hidden)?;
    } else {
        writeln!(out, "# {}", labels.join(", "))?;
    }
    Ok(())
}

fn print_row(store: &ColumnVisibilityStore, row: &Row) -> Result<()> {
    let fields: Vec<String> = store
        .visible_fields(row)
        .into_iter()
        .map(|(column, value)| format!("{}: {}", column.label(), value))
        .collect();

    let mut out = std::io::stdout().lock();
    writeln!(
        out,
        "[{}] {}",
        row.received_at().format("%H:%M:%S%.3f"),
        fields.join("  ")
    )?;
    Ok(())
}
