//! Category derivation
//!
//! Categories are not stored on their own; they are derived from the quote
//! collection and rebuilt after every mutation.

use std::collections::BTreeSet;

use crate::models::{Quote, ALL_CATEGORIES};

/// Sorted set of distinct categories present in a collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    categories: Vec<String>,
}

impl CategoryIndex {
    /// Derive the index from a collection
    pub fn from_quotes(quotes: &[Quote]) -> Self {
        let categories: BTreeSet<&str> = quotes.iter().map(|q| q.category.as_str()).collect();
        Self {
            categories: categories.into_iter().map(str::to_string).collect(),
        }
    }

    /// Distinct categories in lexicographic order
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Check if a category is present
    pub fn contains(&self, category: &str) -> bool {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(category))
            .is_ok()
    }

    /// True for the `all` sentinel or any present category
    ///
    /// A restored filter may name a category whose quotes are gone.
    pub fn is_valid_selection(&self, value: &str) -> bool {
        value == ALL_CATEGORIES || self.contains(value)
    }

    /// Number of distinct categories
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
