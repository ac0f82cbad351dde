//! Sync command handlers

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use tracing::debug;

use quotebook_core::{CatalogEvent, EventReceiver, Quote, Resolution, SyncEngine, SyncOutcome};

use crate::output::Output;

/// Conflict strategy chosen on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Merge the server quotes
    Accept,
    /// Keep local quotes only
    Keep,
}

impl From<Strategy> for Resolution {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Accept => Resolution::AcceptRemote,
            Strategy::Keep => Resolution::KeepLocal,
        }
    }
}

/// Sync once with the remote source
pub async fn sync(engine: &SyncEngine, strategy: Option<Strategy>, output: &Output) -> Result<()> {
    output.message("Syncing with server...");

    match engine.sync().await? {
        SyncOutcome::Merged { added: 0 } => {
            output.success("Sync complete - already up to date");
        }
        SyncOutcome::Merged { added } => {
            output.success(&format!(
                "Sync complete - merged {} quote(s) from server",
                added
            ));
        }
        SyncOutcome::Conflict { candidates } => {
            let message = conflict_message(&candidates);
            output.print_conflict(&candidates, &message);

            let resolution = match strategy {
                Some(strategy) => strategy.into(),
                None if output.should_prompt() => prompt_resolution()?,
                None => bail!(
                    "{}. Re-run with --strategy accept or --strategy keep",
                    message
                ),
            };

            resolve(engine, resolution, output).await?;
        }
    }

    Ok(())
}

/// Keep syncing on the configured interval until Ctrl-C
pub async fn watch(
    engine: Arc<SyncEngine>,
    mut events: EventReceiver,
    strategy: Option<Strategy>,
    output: &Output,
) -> Result<()> {
    output.message(&format!(
        "Auto-sync every {}s. Press Ctrl-C to stop.",
        engine.options().interval.as_secs()
    ));
    engine.enable_auto_sync();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted, stopping watch");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                handle_event(&engine, event, strategy, output).await?;
            }
        }
    }

    engine.disable_auto_sync();
    output.message("Auto-sync stopped.");
    Ok(())
}

async fn handle_event(
    engine: &SyncEngine,
    event: CatalogEvent,
    strategy: Option<Strategy>,
    output: &Output,
) -> Result<()> {
    match event {
        CatalogEvent::SyncStatusChanged {
            phase,
            message,
            time,
        } => output.print_sync_status(phase, &message, time),
        CatalogEvent::CategoriesChanged(categories) => {
            output.message(&format!("Categories: {}", categories.join(", ")));
        }
        CatalogEvent::ConflictRaised {
            candidates,
            message,
        } => {
            output.print_conflict(&candidates, &message);

            let resolution = match strategy {
                Some(strategy) => strategy.into(),
                None if output.should_prompt() => tokio::task::spawn_blocking(prompt_resolution)
                    .await
                    .context("Prompt task failed")??,
                None => {
                    output.message("Conflict left pending; syncing is paused until it is resolved.");
                    return Ok(());
                }
            };

            resolve(engine, resolution, output).await?;
        }
        CatalogEvent::ConflictResolved | CatalogEvent::QuoteDisplayed(_) => {}
    }

    Ok(())
}

async fn resolve(engine: &SyncEngine, resolution: Resolution, output: &Output) -> Result<()> {
    let added = engine.resolve(resolution).await?;

    match resolution {
        Resolution::AcceptRemote => {
            output.success(&format!("Accepted {} quote(s) from server", added));
        }
        Resolution::KeepLocal => {
            output.success("Kept local quotes, server copy updated");
        }
    }
    Ok(())
}

fn conflict_message(candidates: &[Quote]) -> String {
    format!(
        "{} new quote(s) on the server conflict with recent local changes",
        candidates.len()
    )
}

/// Ask which side wins
fn prompt_resolution() -> Result<Resolution> {
    println!("  [1] Accept server quotes");
    println!("  [2] Keep local quotes");
    println!();
    print!("> ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    match input.trim() {
        "1" => Ok(Resolution::AcceptRemote),
        "2" => Ok(Resolution::KeepLocal),
        _ => bail!("Invalid choice. Please run the command again and enter 1 or 2."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_maps_to_resolution() {
        assert_eq!(Resolution::from(Strategy::Accept), Resolution::AcceptRemote);
        assert_eq!(Resolution::from(Strategy::Keep), Resolution::KeepLocal);
    }

    #[test]
    fn test_conflict_message_counts_candidates() {
        let candidates = vec![Quote::new("R1", "Server Wisdom")];
        assert!(conflict_message(&candidates).starts_with("1 new quote(s)"));
    }
}
