//! QuoteStore - per-language cache of parsed quotes and messages
//!
//! Each language owns two resources, loaded lazily on first selection and kept
//! for the life of the store:
//! - `<lang>/quotes.csv`    parsed by `dataset::parse_quotes`
//! - `<lang>/messages.json` parsed by `dataset::parse_messages`
//!
//! Concurrency Model:
//! - The cache sits behind a `parking_lot::RwLock`; the lock is never held across an await
//! - `ensure_loaded` runs both loads concurrently and installs each result as soon as
//!   it completes, so one slow or failed resource never holds back the other
//! - A failed load installs an empty dataset/table, which marks the language as loaded
//!   and keeps the UI on "no quote found" instead of retrying forever. The placeholder
//!   is flagged, so `clear_failed` (called when a viewer re-selects the language) can
//!   drop it and let the next `ensure_loaded` try again

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::clock::TimeKey;
use crate::dataset::{parse_messages, parse_quotes};
use crate::interface::{Language, QuoteRecord, QuoteSelector, ResourceLoader};
use crate::models::{MessageKey, MessageTable, QuoteDataset};
use crate::selection::RandomSelector;

/// Location of the quote resource for `language`, relative to the loader base
pub fn quotes_location(language: &Language) -> String {
    format!("{}/quotes.csv", language)
}

/// Location of the messages resource for `language`, relative to the loader base
pub fn messages_location(language: &Language) -> String {
    format!("{}/messages.json", language)
}

#[derive(Debug, Clone, Default)]
struct LanguageEntry {
    dataset: Option<Arc<QuoteDataset>>,
    messages: Option<Arc<MessageTable>>,
    quotes_failed: bool,
    messages_failed: bool,
}

/// Owns every parsed resource of a session. Share it as `Arc<QuoteStore>`.
pub struct QuoteStore {
    loader: Arc<dyn ResourceLoader>,
    selector: Box<dyn QuoteSelector>,
    cache: RwLock<HashMap<Language, LanguageEntry>>,
}

impl QuoteStore {
    pub fn new(loader: Arc<dyn ResourceLoader>, selector: Box<dyn QuoteSelector>) -> Self {
        Self {
            loader,
            selector,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Store with the production selection policy (uniformly random)
    pub fn with_random_selection(loader: Arc<dyn ResourceLoader>) -> Self {
        Self::new(loader, Box::new(RandomSelector))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────────────────────

    /// Load whatever is missing for `language`. A no-op once both resources are present.
    pub async fn ensure_loaded(&self, language: &Language) {
        let (need_quotes, need_messages) = {
            let cache = self.cache.read();
            match cache.get(language) {
                Some(entry) => (entry.dataset.is_none(), entry.messages.is_none()),
                None => (true, true),
            }
        };

        if !need_quotes && !need_messages {
            tracing::trace!(%language, "resources already cached");
            return;
        }

        let quotes = async {
            if need_quotes {
                self.load_quotes(language).await;
            }
        };
        let messages = async {
            if need_messages {
                self.load_messages(language).await;
            }
        };
        futures::join!(quotes, messages);
    }

    async fn load_quotes(&self, language: &Language) {
        let location = quotes_location(language);
        match self.loader.load(&location).await {
            Ok(raw) => self.install_dataset(language, parse_quotes(&raw)),
            Err(e) => {
                tracing::warn!(%language, %location, error = %e, "quote resource failed to load, using empty dataset");
                let mut cache = self.cache.write();
                let entry = cache.entry(language.clone()).or_default();
                if entry.dataset.is_none() {
                    entry.dataset = Some(Arc::new(QuoteDataset::new()));
                    entry.quotes_failed = true;
                }
            }
        }
    }

    async fn load_messages(&self, language: &Language) {
        let location = messages_location(language);
        match self.loader.load(&location).await {
            Ok(raw) => self.install_messages(language, parse_messages(&raw)),
            Err(e) => {
                tracing::warn!(%language, %location, error = %e, "messages resource failed to load, using empty table");
                let mut cache = self.cache.write();
                let entry = cache.entry(language.clone()).or_default();
                if entry.messages.is_none() {
                    entry.messages = Some(Arc::new(MessageTable::new()));
                    entry.messages_failed = true;
                }
            }
        }
    }

    /// Drop the placeholders left by failed loads of `language`, so the next
    /// `ensure_loaded` fetches those resources again. Returns whether any were dropped.
    pub fn clear_failed(&self, language: &Language) -> bool {
        let mut cache = self.cache.write();
        let Some(entry) = cache.get_mut(language) else {
            return false;
        };

        let mut cleared = false;
        if std::mem::take(&mut entry.quotes_failed) {
            entry.dataset = None;
            cleared = true;
        }
        if std::mem::take(&mut entry.messages_failed) {
            entry.messages = None;
            cleared = true;
        }
        cleared
    }

    /// Install a parsed dataset, replacing nothing that is already cached
    pub fn install_dataset(&self, language: &Language, dataset: QuoteDataset) {
        let mut cache = self.cache.write();
        let entry = cache.entry(language.clone()).or_default();
        if entry.dataset.is_none() {
            tracing::debug!(%language, keys = dataset.len(), "installed quote dataset");
            entry.dataset = Some(Arc::new(dataset));
        }
    }

    /// Install a parsed message table, replacing nothing that is already cached
    pub fn install_messages(&self, language: &Language, messages: MessageTable) {
        let mut cache = self.cache.write();
        let entry = cache.entry(language.clone()).or_default();
        if entry.messages.is_none() {
            tracing::debug!(%language, entries = messages.len(), "installed message table");
            entry.messages = Some(Arc::new(messages));
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn has_dataset(&self, language: &Language) -> bool {
        self.cache
            .read()
            .get(language)
            .is_some_and(|entry| entry.dataset.is_some())
    }

    pub fn has_messages(&self, language: &Language) -> bool {
        self.cache
            .read()
            .get(language)
            .is_some_and(|entry| entry.messages.is_some())
    }

    pub fn is_loaded(&self, language: &Language) -> bool {
        self.has_dataset(language) && self.has_messages(language)
    }

    fn dataset(&self, language: &Language) -> Option<Arc<QuoteDataset>> {
        self.cache.read().get(language).and_then(|entry| entry.dataset.clone())
    }

    fn messages(&self, language: &Language) -> Option<Arc<MessageTable>> {
        self.cache.read().get(language).and_then(|entry| entry.messages.clone())
    }

    /// The quote shown for `time_key`, or `None` when the language is not loaded,
    /// the key is absent, or its list is empty
    pub fn lookup_quote(&self, language: &Language, time_key: &TimeKey) -> Option<QuoteRecord> {
        let dataset = self.dataset(language)?;
        let candidates = dataset.get(time_key.as_str())?;
        if candidates.is_empty() {
            return None;
        }
        let index = self.selector.select(candidates);
        candidates.get(index).or_else(|| candidates.first()).cloned()
    }

    pub fn lookup_message(&self, language: &Language, key: &str) -> Option<String> {
        let messages = self.messages(language)?;
        messages.get(key).map(str::to_string)
    }

    /// Localized text for `key`, or its built-in default
    pub fn message_or_default(&self, language: &Language, key: MessageKey) -> String {
        self.lookup_message(language, key.as_str())
            .unwrap_or_else(|| key.default_text().to_string())
    }
}
