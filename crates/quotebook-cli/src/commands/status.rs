//! Status command handler

use anyhow::Result;
use chrono::Local;

use quotebook_core::{Catalog, Config, SyncEngine};

use crate::output::{Output, OutputFormat};

/// Show status information
pub async fn show(
    catalog: &Catalog,
    engine: &SyncEngine,
    config: &Config,
    output: &Output,
) -> Result<()> {
    let stats = catalog.stats().await?;
    let sync = engine.snapshot().await;
    let storage_path = config.storage_path();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "quotes": stats.total_quotes,
                    "categories": stats.total_categories,
                    "filter": catalog.filter().as_str(),
                    "last_viewed": stats.last_viewed,
                    "storage": {
                        "path": storage_path,
                        "exists": storage_path.exists(),
                    },
                    "sync": {
                        "remote_url": config.remote_url,
                        "phase": sync.phase.as_str(),
                        "auto_sync": config.auto_sync,
                        "interval_secs": config.sync_interval_secs,
                        "conflict_window_secs": config.conflict_window_secs,
                        "last_sync_time": sync.last_sync_time,
                        "last_error": sync.last_error,
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", stats.total_quotes);
        }
        OutputFormat::Human => {
            println!("Quotebook Status");
            println!("================");
            println!();
            println!("Catalog:");
            println!("  Quotes:     {}", stats.total_quotes);
            println!("  Categories: {}", stats.total_categories);
            println!("  Filter:     {}", catalog.filter());
            if let Some(viewed) = stats.last_viewed {
                println!(
                    "  Last viewed: {}",
                    viewed.with_timezone(&Local).format("%H:%M:%S")
                );
            }
            println!();
            println!("Sync:");
            println!("  Server:      {}", config.remote_url);
            println!(
                "  Auto-sync:   {}",
                if config.auto_sync {
                    format!("every {}s", config.sync_interval_secs)
                } else {
                    "disabled".to_string()
                }
            );
            println!("  Conflict window: {}s", config.conflict_window_secs);
            println!("  State:       {}", sync.phase);
            if let Some(ref error) = sync.last_error {
                println!("  Last error:  {}", error);
            }
            println!();
            println!("Storage:");
            println!("  Location: {}", storage_path.display());
        }
    }

    Ok(())
}
