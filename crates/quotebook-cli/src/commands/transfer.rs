//! Import and export command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;

use quotebook_core::Catalog;

use crate::output::{Output, OutputFormat};

/// Export every quote to a JSON file
///
/// Without a path the file lands in the current directory under the dated
/// default name. `-` writes to stdout.
pub async fn export(catalog: &Catalog, path: Option<PathBuf>, output: &Output) -> Result<()> {
    let document = catalog.export_json(Local::now().date_naive()).await?;

    if path.as_deref() == Some(std::path::Path::new("-")) {
        println!("{}", document.contents);
        return Ok(());
    }

    let path = path.unwrap_or_else(|| PathBuf::from(&document.file_name));
    std::fs::write(&path, &document.contents)
        .with_context(|| format!("Failed to write export file: {:?}", path))?;

    match output.format {
        OutputFormat::Quiet => println!("{}", path.display()),
        _ => output.success(&format!("Quotes exported to {}", path.display())),
    }
    Ok(())
}

/// Import quotes from a JSON file
pub async fn import(catalog: &mut Catalog, path: PathBuf, output: &Output) -> Result<()> {
    let raw = std::fs::read(&path)
        .with_context(|| format!("Error reading file: {:?}", path))?;

    let report = catalog
        .import_json(&raw)
        .await
        .context("Error importing quotes")?;

    output.success(&report.message);
    if report.dropped > 0 {
        output.message(&format!(
            "Skipped {} entr{} without text and category",
            report.dropped,
            if report.dropped == 1 { "y" } else { "ies" }
        ));
    }
    if !report.new_categories.is_empty() {
        output.message(&format!(
            "New categories: {}",
            report.new_categories.join(", ")
        ));
    }
    Ok(())
}
