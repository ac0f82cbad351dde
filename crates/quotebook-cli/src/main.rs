//! Quotebook CLI
//!
//! Command-line interface for Quotebook - a local-first quote catalog.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use quotebook_core::{
    events, Catalog, Config, HttpRemote, StorageError, SyncEngine, SyncOptions,
};

mod commands;
mod output;

use commands::sync::Strategy;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "quotebook")]
#[command(about = "Quotebook - Local-first quote catalog with remote sync")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to an alternative config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a quote (default unless auto_sync is set)
    Show,
    /// Show another random quote
    Next,
    /// Add a quote
    Add {
        /// Quote text
        text: String,
        /// Quote category
        #[arg(short, long)]
        category: String,
    },
    /// List quotes in the active category
    #[command(alias = "ls")]
    List,
    /// List all categories
    Categories,
    /// Show or set the category filter ("all" clears it)
    Filter {
        /// Category name or "all"
        category: Option<String>,
    },
    /// Export all quotes to a JSON file
    Export {
        /// Output path ("-" for stdout), defaults to quotes_export_<date>.json
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import quotes from a JSON file
    Import {
        /// JSON file containing an array of quotes
        file: PathBuf,
    },
    /// Sync with the remote quote source
    Sync {
        /// Resolve a conflict without prompting
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
    },
    /// Sync periodically until interrupted
    Watch {
        /// Resolve conflicts without prompting
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
    },
    /// Show catalog and sync status
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (remote_url, auto_sync, sync_interval_secs, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let result = run(Cli::parse()).await;
    if let Err(e) = &result {
        if let Some(hint) = recovery_hint(e) {
            eprintln!("Hint: {}", hint);
        }
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need the catalog
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), &output);
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    init_logging(&config, cli.verbose)?;

    let (events, event_rx) = events::channel();
    let mut catalog = Catalog::open(&config, events.clone())
        .with_context(|| format!("Failed to open quote storage in {:?}", config.data_dir))?;

    let remote = Arc::new(HttpRemote::from_config(&config)?);
    let engine = Arc::new(SyncEngine::new(
        catalog.store(),
        remote,
        events,
        SyncOptions::from_config(&config),
    ));
    debug!("Remote quote source: {}", config.remote_url);

    // With auto-sync configured, a bare `quotebook` keeps syncing
    let command = cli.command.unwrap_or(if config.auto_sync {
        Commands::Watch { strategy: None }
    } else {
        Commands::Show
    });

    match command {
        Commands::Show => commands::quote::show(&catalog, &output).await,
        Commands::Next => commands::quote::next(&catalog, &output).await,
        Commands::Add { text, category } => {
            commands::quote::add(&mut catalog, &text, &category, &output).await
        }
        Commands::List => commands::quote::list(&catalog, &output).await,
        Commands::Categories => commands::category::list(&catalog, &output).await,
        Commands::Filter { category } => {
            commands::category::filter(&mut catalog, category, &output).await
        }
        Commands::Export { output: path } => {
            commands::transfer::export(&catalog, path, &output).await
        }
        Commands::Import { file } => commands::transfer::import(&mut catalog, file, &output).await,
        Commands::Sync { strategy } => commands::sync::sync(&engine, strategy, &output).await,
        Commands::Watch { strategy } => {
            commands::sync::watch(engine, event_rx, strategy, &output).await
        }
        Commands::Status => commands::status::show(&catalog, &engine, &config, &output).await,
        Commands::Config { .. } => Ok(()), // Handled above
    }
}

/// Look through the error chain for a storage failure with a hint
fn recovery_hint(error: &anyhow::Error) -> Option<&'static str> {
    error.chain().find_map(|cause| {
        cause
            .downcast_ref::<quotebook_core::Error>()
            .and_then(quotebook_core::Error::recovery_hint)
            .or_else(|| {
                cause
                    .downcast_ref::<StorageError>()
                    .and_then(StorageError::recovery_hint)
            })
    })
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Install the tracing subscriber
///
/// `RUST_LOG` wins over `--verbose`. Logs go to stderr unless `log_file` is
/// configured.
fn init_logging(config: &Config, verbose: u8) -> Result<()> {
    let env_filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => {
            let level = match verbose {
                0 => "warn",
                1 => "info",
                _ => "debug",
            };
            EnvFilter::new(format!("quotebook_core={},quotebook_cli={}", level, level))
        }
    };

    match &config.log_file {
        Some(path) => {
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Could not open log file {:?}", path))?;

            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_strategy() {
        let cli = Cli::parse_from(["quotebook", "sync", "--strategy", "accept"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Sync {
                strategy: Some(Strategy::Accept)
            })
        ));
    }

    #[test]
    fn test_parse_add_with_global_flags() {
        let cli = Cli::parse_from(["quotebook", "add", "Be kind.", "-c", "Kindness", "--json"]);
        assert!(cli.json);
        match cli.command {
            Some(Commands::Add { text, category }) => {
                assert_eq!(text, "Be kind.");
                assert_eq!(category, "Kindness");
            }
            _ => panic!("expected add command"),
        }
    }

    #[test]
    fn test_recovery_hint_found_behind_context() {
        let storage = StorageError::Corrupt {
            path: PathBuf::from("/data/local_storage.json"),
            details: "expected value".to_string(),
        };
        let err = anyhow::Error::new(quotebook_core::Error::from(storage))
            .context("Failed to open quote storage");

        assert_eq!(
            recovery_hint(&err),
            Some("Move the store file aside to start with the default quotes.")
        );
    }

    #[test]
    fn test_recovery_hint_absent_for_other_errors() {
        let err = anyhow::Error::new(quotebook_core::Error::Network("offline".to_string()));
        assert!(recovery_hint(&err).is_none());
        assert!(recovery_hint(&anyhow::anyhow!("plain failure")).is_none());
    }

    #[test]
    fn test_no_command_defaults_to_none() {
        let cli = Cli::parse_from(["quotebook", "-vv"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.command.is_none());
    }
}
