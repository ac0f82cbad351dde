//! Category command handlers

use anyhow::Result;

use quotebook_core::Catalog;

use crate::output::Output;

/// List all categories
pub async fn list(catalog: &Catalog, output: &Output) -> Result<()> {
    let categories = catalog.categories().await;
    output.print_categories(&categories, catalog.filter());
    Ok(())
}

/// Show or change the active filter
pub async fn filter(catalog: &mut Catalog, value: Option<String>, output: &Output) -> Result<()> {
    match value {
        Some(value) => {
            let filter = catalog.set_filter(&value).await?;
            output.success(&format!("Filter set to '{}'", filter));
        }
        None => {
            output.message(&format!("Current filter: {}", catalog.filter()));
        }
    }
    Ok(())
}
