//! Append-only source URL to published URL mapping.

use std::collections::HashMap;

/// Mapping from source URL to published URL, in insertion order.
///
/// Entries are never replaced or removed: inserting a URL that is already
/// mapped is a no-op that returns `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlMapping {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl UrlMapping {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `original -> published`. Returns `false` when `original`
    /// was already mapped (the existing entry is kept).
    pub fn insert(&mut self, original: impl Into<String>, published: impl Into<String>) -> bool {
        let original = original.into();
        if self.index.contains_key(&original) {
            return false;
        }
        self.index.insert(original.clone(), self.entries.len());
        self.entries.push((original, published.into()));
        true
    }

    /// Looks up the published URL for `original`.
    #[must_use]
    pub fn get(&self, original: &str) -> Option<&str> {
        self.index
            .get(original)
            .map(|&position| self.entries[position].1.as_str())
    }

    /// Number of mapped URLs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing was mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(original, published)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(original, published)| (original.as_str(), published.as_str()))
    }
}
