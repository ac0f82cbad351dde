//! Quote command handlers

use anyhow::Result;

use quotebook_core::Catalog;

use crate::output::Output;

/// Show a quote: the last one viewed this session, or a random pick
pub async fn show(catalog: &Catalog, output: &Output) -> Result<()> {
    match catalog.initial_quote().await? {
        Some(shown) => output.print_quote(&shown.quote, shown.restored),
        None => output.message("No quotes available in this category."),
    }
    Ok(())
}

/// Show a fresh random quote
pub async fn next(catalog: &Catalog, output: &Output) -> Result<()> {
    match catalog.random_quote().await? {
        Some(quote) => output.print_quote(&quote, false),
        None => output.message("No quotes available in this category."),
    }
    Ok(())
}

/// Add a quote; the filter switches to its category
pub async fn add(catalog: &mut Catalog, text: &str, category: &str, output: &Output) -> Result<()> {
    let quote = catalog.add_quote(text, category).await?;
    output.success(&format!(
        "Quote added to '{}' and saved to local storage",
        quote.category
    ));

    if let Some(shown) = catalog.random_quote().await? {
        output.print_quote(&shown, false);
    }
    Ok(())
}

/// List quotes passing the active filter
pub async fn list(catalog: &Catalog, output: &Output) -> Result<()> {
    let quotes = catalog.quotes().await;
    output.print_quotes(&quotes, catalog.filter());
    Ok(())
}
