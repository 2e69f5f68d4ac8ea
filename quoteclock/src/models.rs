//! Parsed per-language data: quote datasets and message tables

use std::collections::HashMap;

use crate::interface::QuoteRecord;

// ─────────────────────────────────────────────────────────────────────────────
// QUOTE DATASET
// ─────────────────────────────────────────────────────────────────────────────

/// All quotes of one language, partitioned by time key.
///
/// Keys are stored verbatim as they appear in the resource, so a line whose key
/// is not a canonical `HH:MM` is kept but can never be looked up. Every list is
/// non-empty and keeps parse order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteDataset {
    by_key: HashMap<String, Vec<QuoteRecord>>,
    record_count: usize,
}

impl QuoteDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the list for `key`, creating the list on first use
    pub fn insert(&mut self, key: impl Into<String>, record: QuoteRecord) {
        self.by_key.entry(key.into()).or_default().push(record);
        self.record_count += 1;
    }

    pub fn get(&self, key: &str) -> Option<&[QuoteRecord]> {
        self.by_key.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Number of distinct time keys
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Number of records across all keys
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.by_key.keys().map(String::as_str)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MESSAGE TABLE
// ─────────────────────────────────────────────────────────────────────────────

/// Well-known message keys with built-in fallback text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    QuoteLoading,
    NoQuoteFound,
}

impl MessageKey {
    /// Key as it appears in the messages resource
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKey::QuoteLoading => "QUOTE_LOADING",
            MessageKey::NoQuoteFound => "NO_QUOTE_FOUND",
        }
    }

    /// Text used when the loaded table lacks this key
    pub fn default_text(self) -> &'static str {
        match self {
            MessageKey::QuoteLoading => "Loading quote...",
            MessageKey::NoQuoteFound => "No quote found for this minute.",
        }
    }
}

/// Localized system strings for one language
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageTable {
    entries: HashMap<String, String>,
}

impl MessageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<HashMap<String, String>> for MessageTable {
    fn from(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }
}
