//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use quotebook_core::{CategoryFilter, Quote, SyncPhase};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single quote
    ///
    /// `restored` marks a quote shown again from the current session.
    pub fn print_quote(&self, quote: &Quote, restored: bool) {
        match self.format {
            OutputFormat::Human => {
                println!("\"{}\"", quote.text);
                if restored {
                    println!("  - {} (Last viewed)", quote.category);
                } else {
                    println!("  - {}", quote.category);
                }
            }
            OutputFormat::Json => print_json(quote),
            OutputFormat::Quiet => {
                println!("{}", quote.text);
            }
        }
    }

    /// Print a list of quotes
    pub fn print_quotes(&self, quotes: &[Quote], filter: &CategoryFilter) {
        match self.format {
            OutputFormat::Human => {
                if quotes.is_empty() {
                    println!("No quotes available in this category.");
                    return;
                }
                for quote in quotes {
                    let origin = if quote.is_remote() { " [server]" } else { "" };
                    println!(
                        "{} | {}{}",
                        truncate(&quote.category, 20),
                        truncate(&quote.text, 70),
                        origin
                    );
                }
                match filter {
                    CategoryFilter::All => println!("\n{} quote(s)", quotes.len()),
                    CategoryFilter::Category(category) => {
                        println!("\n{} quote(s) in {}", quotes.len(), category)
                    }
                }
            }
            OutputFormat::Json => print_json(&quotes),
            OutputFormat::Quiet => {
                for quote in quotes {
                    println!("{}", quote.text);
                }
            }
        }
    }

    /// Print the category list, marking the active filter
    pub fn print_categories(&self, categories: &[String], filter: &CategoryFilter) {
        match self.format {
            OutputFormat::Human => {
                if categories.is_empty() {
                    println!("No categories found.");
                    return;
                }
                for category in categories {
                    let marker = if filter.as_str() == category { "*" } else { " " };
                    println!("{} {}", marker, category);
                }
                println!("\n{} categories (filter: {})", categories.len(), filter);
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({
                    "categories": categories,
                    "filter": filter.as_str(),
                }));
            }
            OutputFormat::Quiet => {
                for category in categories {
                    println!("{}", category);
                }
            }
        }
    }

    /// Print the remote quotes held back by a conflict
    pub fn print_conflict(&self, candidates: &[Quote], message: &str) {
        match self.format {
            OutputFormat::Human => {
                println!("⚠ {}", message);
                println!();
                for quote in candidates {
                    println!("  + {} | {}", quote.category, truncate(&quote.text, 70));
                }
                println!();
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({
                    "status": "conflict",
                    "message": message,
                    "candidates": candidates,
                }));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a sync status change
    pub fn print_sync_status(&self, phase: SyncPhase, message: &str, time: Option<DateTime<Utc>>) {
        match self.format {
            OutputFormat::Human => match time {
                Some(time) => println!(
                    "[{}] {}: {}",
                    time.with_timezone(&Local).format("%H:%M:%S"),
                    phase,
                    message
                ),
                None => println!("{}: {}", phase, message),
            },
            OutputFormat::Json => {
                print_json(&serde_json::json!({
                    "phase": phase.as_str(),
                    "message": message,
                    "time": time,
                }));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Pretty-print a value as JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to render JSON: {}", e),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
