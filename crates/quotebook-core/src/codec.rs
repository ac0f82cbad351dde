//! JSON import and export
//!
//! Export writes the collection as a pretty-printed JSON array. Import is
//! all-or-nothing at the document level (not an array, or nothing usable,
//! aborts) but lenient per element: elements without string `text` and
//! `category` are dropped and only counted.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::categories::CategoryIndex;
use crate::error::{Error, Result};
use crate::models::Quote;

/// Valid quotes extracted from an import document
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    /// Quotes that passed validation, in document order
    pub quotes: Vec<Quote>,
    /// Categories among them not yet present in the target collection
    pub new_categories: Vec<String>,
    /// Number of elements dropped by validation
    pub dropped: usize,
}

/// Render quotes as a pretty-printed JSON array
pub fn export_quotes(quotes: &[Quote]) -> Result<String> {
    Ok(serde_json::to_string_pretty(quotes)?)
}

/// File name offered for an export made on `date`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("quotes_export_{}.json", date.format("%Y-%m-%d"))
}

/// Parse and validate an import document
///
/// Fails with [`Error::Format`] when the bytes are not JSON, the top-level
/// value is not an array, or no element survives validation.
pub fn import_quotes(raw: &[u8], existing: &CategoryIndex) -> Result<ImportOutcome> {
    let document: Value = serde_json::from_slice(raw)
        .map_err(|e| Error::Format(format!("Not a JSON document: {}", e)))?;

    let Value::Array(elements) = document else {
        return Err(Error::Format("Expected an array of quotes".to_string()));
    };

    let total = elements.len();
    let quotes: Vec<Quote> = elements.into_iter().filter_map(validate_element).collect();

    if quotes.is_empty() {
        return Err(Error::Format("No valid quotes found in the file".to_string()));
    }

    let dropped = total - quotes.len();
    if dropped > 0 {
        debug!("Import dropped {} invalid element(s) of {}", dropped, total);
    }

    let mut seen = HashSet::new();
    let new_categories = quotes
        .iter()
        .map(|q| q.category.as_str())
        .filter(|category| !existing.contains(category) && seen.insert(*category))
        .map(str::to_string)
        .collect();

    Ok(ImportOutcome {
        quotes,
        new_categories,
        dropped,
    })
}

/// Accept an element only if `text` and `category` are non-empty strings and
/// the remaining typed fields decode
fn validate_element(element: Value) -> Option<Quote> {
    let is_filled = |field: &str| {
        element
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|value| !value.is_empty())
    };

    if !is_filled("text") || !is_filled("category") {
        return None;
    }

    serde_json::from_value(element).ok()
}
