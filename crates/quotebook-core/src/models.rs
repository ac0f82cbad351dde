//! Data models for Quotebook
//!
//! Defines the core data structures: Quote, CategoryFilter and the
//! last-viewed marker kept in session storage.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Filter sentinel meaning "every category"
pub const ALL_CATEGORIES: &str = "all";

/// Identifier assigned by the remote source
///
/// The remote treats it as opaque; numbers and strings are both accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerId::Number(n) => write!(f, "{}", n),
            ServerId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A quote with its category
///
/// Identity for merging is `text` (exact, case-sensitive). Unknown JSON
/// fields are carried in `extra` so they survive load, save and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// The quote itself
    pub text: String,
    /// Free-text grouping label
    pub category: String,
    /// Identifier on the remote source, for quotes that came from it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<ServerId>,
    /// When the remote copy was fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_timestamp: Option<DateTime<Utc>>,
    /// Any other fields, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Quote {
    /// Create a local quote (no validation; see [`Quote::validated`])
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
            server_id: None,
            server_timestamp: None,
            extra: Map::new(),
        }
    }

    /// Create a quote from user input, trimming both fields
    ///
    /// Fails with [`Error::Validation`] if either field is blank.
    pub fn validated(text: &str, category: &str) -> Result<Self> {
        let text = text.trim();
        let category = category.trim();

        if text.is_empty() || category.is_empty() {
            return Err(Error::Validation(
                "Please enter both a quote and a category".to_string(),
            ));
        }

        Ok(Self::new(text, category))
    }

    /// Tag this quote with remote-origin metadata
    pub fn with_server_origin(mut self, id: ServerId, fetched_at: DateTime<Utc>) -> Self {
        self.server_id = Some(id);
        self.server_timestamp = Some(fetched_at);
        self
    }

    /// Whether this quote came from the remote source
    pub fn is_remote(&self) -> bool {
        self.server_id.is_some()
    }
}

/// Active category filter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// No filtering
    #[default]
    All,
    /// Only quotes in this category
    Category(String),
}

impl CategoryFilter {
    /// Parse a stored or user-supplied value; `all` is the sentinel
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Category(value.to_string())
        }
    }

    /// Value as stored in key-value storage
    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Category(category) => category,
        }
    }

    /// Check whether a quote passes this filter
    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(category) => quote.category == *category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The most recently displayed quote, kept for the current session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastViewedQuote {
    pub text: String,
    pub category: String,
    pub timestamp: DateTime<Utc>,
}

impl LastViewedQuote {
    pub fn new(quote: &Quote, timestamp: DateTime<Utc>) -> Self {
        Self {
            text: quote.text.clone(),
            category: quote.category.clone(),
            timestamp,
        }
    }

    /// The viewed quote as a plain local quote
    pub fn to_quote(&self) -> Quote {
        Quote::new(self.text.clone(), self.category.clone())
    }
}

/// Quotes a fresh catalog starts with
pub fn default_quotes() -> Vec<Quote> {
    [
        (
            "The only way to do great work is to love what you do.",
            "Motivation",
        ),
        (
            "Life is what happens when you're busy making other plans.",
            "Life",
        ),
        (
            "The future belongs to those who believe in the beauty of their dreams.",
            "Inspiration",
        ),
        (
            "Success is not final, failure is not fatal: it is the courage to continue that counts.",
            "Success",
        ),
        ("In the middle of difficulty lies opportunity.", "Wisdom"),
        (
            "The best time to plant a tree was 20 years ago. The second best time is now.",
            "Wisdom",
        ),
        ("You miss 100% of the shots you don't take.", "Motivation"),
        (
            "Whether you think you can or you think you can't, you're right.",
            "Mindset",
        ),
    ]
    .into_iter()
    .map(|(text, category)| Quote::new(text, category))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_trims_input() {
        let quote = Quote::validated("  Stay hungry.  ", " Drive ").unwrap();
        assert_eq!(quote.text, "Stay hungry.");
        assert_eq!(quote.category, "Drive");
        assert!(!quote.is_remote());
    }

    #[test]
    fn test_validated_rejects_blank_fields() {
        assert!(matches!(
            Quote::validated("   ", "Life"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            Quote::validated("Something", ""),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_serialization_uses_camel_case_and_skips_empty_origin() {
        let local = Quote::new("A", "C1");
        let json = serde_json::to_value(&local).unwrap();
        assert_eq!(json, serde_json::json!({"text": "A", "category": "C1"}));

        let fetched_at = "2026-10-17T12:00:00Z".parse().unwrap();
        let remote = Quote::new("B", "C2").with_server_origin(ServerId::Number(4), fetched_at);
        let json = serde_json::to_value(&remote).unwrap();
        assert_eq!(json["serverId"], 4);
        assert_eq!(json["serverTimestamp"], "2026-10-17T12:00:00Z");
    }

    #[test]
    fn test_extra_fields_survive_round_trip() {
        let raw = r#"{"text":"A","category":"C1","serverId":"abc","author":"Anon"}"#;
        let quote: Quote = serde_json::from_str(raw).unwrap();

        assert_eq!(quote.server_id, Some(ServerId::Text("abc".to_string())));
        assert_eq!(quote.extra.get("author"), Some(&Value::from("Anon")));

        let back = serde_json::to_value(&quote).unwrap();
        assert_eq!(back["author"], "Anon");
        assert_eq!(back["serverId"], "abc");
    }

    #[test]
    fn test_category_filter_parse() {
        assert_eq!(CategoryFilter::parse("all"), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse(""), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::parse("Wisdom"),
            CategoryFilter::Category("Wisdom".to_string())
        );
        assert_eq!(CategoryFilter::All.to_string(), "all");
    }

    #[test]
    fn test_category_filter_matches() {
        let quote = Quote::new("A", "Wisdom");
        assert!(CategoryFilter::All.matches(&quote));
        assert!(CategoryFilter::parse("Wisdom").matches(&quote));
        assert!(!CategoryFilter::parse("wisdom").matches(&quote));
    }

    #[test]
    fn test_default_quotes() {
        let quotes = default_quotes();
        assert_eq!(quotes.len(), 8);
        assert!(quotes.iter().all(|q| !q.text.is_empty() && !q.category.is_empty()));
    }
}
