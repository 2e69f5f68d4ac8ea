//! DisplayController - turns language changes and ticks into display states
//!
//! State machine:
//!
//! ```text
//! Uninitialized --set_language--> Loading(lang) --loaded--> Ready(lang, key)
//!                                       ^                        |
//!                                       +------set_language------+
//! ```
//!
//! Every update builds a new `Arc<DisplayState>`; a tick whose time key did not
//! change leaves the current `Arc` untouched, so views can skip re-rendering by
//! pointer comparison.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::{key_for, ClockZone, TimeKey};
use crate::interface::{ClockError, DisplayState, Language, Phase, Snapshot};
use crate::models::MessageKey;
use crate::store::QuoteStore;

pub struct DisplayController {
    store: Arc<QuoteStore>,
    zone: ClockZone,
    languages: Vec<Language>,
    phase: Phase,
    language: Option<Language>,
    last_key: Option<TimeKey>,
    display: Arc<DisplayState>,
}

impl DisplayController {
    /// `languages` is the closed set a viewer may switch between
    pub fn new(store: Arc<QuoteStore>, zone: ClockZone, languages: Vec<Language>) -> Self {
        Self {
            store,
            zone,
            languages,
            phase: Phase::Uninitialized,
            language: None,
            last_key: None,
            display: Arc::new(DisplayState::default()),
        }
    }

    pub fn store(&self) -> &Arc<QuoteStore> {
        &self.store
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn language(&self) -> Option<&Language> {
        self.language.as_ref()
    }

    pub fn last_key(&self) -> Option<&TimeKey> {
        self.last_key.as_ref()
    }

    pub fn display(&self) -> Arc<DisplayState> {
        Arc::clone(&self.display)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            language: self.language.clone(),
            phase: self.phase,
            display: self.display(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────────────

    /// Switch language and wait for its resources, then show the current quote
    pub async fn set_language(&mut self, language: Language, now: DateTime<Utc>) -> Result<(), ClockError> {
        if self.begin_language(language.clone(), now)? {
            self.store.ensure_loaded(&language).await;
            self.finish_loading(&language, now);
        }
        Ok(())
    }

    /// First half of a language switch, for hosts that run the load elsewhere.
    ///
    /// Drops the previous display, enters `Loading` and returns `true` when the
    /// caller must run `QuoteStore::ensure_loaded` and then call `finish_loading`.
    /// Returns `false` when the resources are already cached; the controller is
    /// then `Ready` immediately.
    pub fn begin_language(&mut self, language: Language, now: DateTime<Utc>) -> Result<bool, ClockError> {
        if !self.languages.contains(&language) {
            return Err(ClockError::UnsupportedLanguage(language));
        }

        tracing::info!(%language, "language selected");
        if self.store.clear_failed(&language) {
            tracing::info!(%language, "retrying resources that failed to load");
        }
        let needs_load = !self.store.is_loaded(&language);
        self.language = Some(language);
        self.last_key = Some(key_for(now, &self.zone));
        self.phase = if needs_load { Phase::Loading } else { Phase::Ready };
        self.recompute_display();
        Ok(needs_load)
    }

    /// Second half of a language switch. Ignored when `language` is no longer
    /// selected, so a late load never replaces another language's display.
    /// Returns whether the display changed.
    pub fn finish_loading(&mut self, language: &Language, now: DateTime<Utc>) -> bool {
        if self.language.as_ref() != Some(language) {
            tracing::debug!(%language, "load finished for a language that is no longer selected");
            return false;
        }
        if self.phase == Phase::Ready {
            return false;
        }

        self.phase = Phase::Ready;
        self.last_key = Some(key_for(now, &self.zone));
        self.recompute_display();
        true
    }

    /// Advance to `now`. Returns whether the display changed; a tick within the
    /// same minute is a no-op.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if self.language.is_none() {
            return false;
        }

        let key = key_for(now, &self.zone);
        if self.last_key.as_ref() == Some(&key) {
            tracing::trace!(%key, "same minute, skipping recompute");
            return false;
        }

        tracing::debug!(%key, "minute changed");
        self.last_key = Some(key);
        self.recompute_display();
        true
    }

    /// Rebuild the display for the current language and time key
    pub fn recompute_display(&mut self) {
        let Some(language) = self.language.as_ref() else {
            return;
        };

        let state = if !self.store.has_dataset(language) {
            DisplayState::message(self.store.message_or_default(language, MessageKey::QuoteLoading))
        } else {
            let record = self
                .last_key
                .as_ref()
                .and_then(|key| self.store.lookup_quote(language, key));
            match record {
                Some(record) => DisplayState::from_record(&record),
                None => DisplayState::message(self.store.message_or_default(language, MessageKey::NoQuoteFound)),
            }
        };

        self.display = Arc::new(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::TextFragment;
    use crate::loader::StaticLoader;
    use crate::selection::FirstSelector;
    use chrono::TimeZone;

    const EN_QUOTES: &str = "\
09:15|=|9:15 AM|=|It is 9:15 AM and the work continues.|=|Daily Notes|=|J. Smith
09:16|=|9:16|=|By 9:16 the kettle had boiled.|=|Kitchen|=|M. Reed";

    const EN_MESSAGES: &str = r#"{"QUOTE_LOADING": "One moment...", "NO_QUOTE_FOUND": "Silence at this minute."}"#;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
    }

    fn en() -> Language {
        Language::from("en")
    }

    fn controller_with(loader: StaticLoader) -> DisplayController {
        let store = Arc::new(QuoteStore::new(Arc::new(loader), Box::new(FirstSelector)));
        DisplayController::new(store, ClockZone::Utc, vec![en(), Language::from("pt")])
    }

    fn full_loader() -> StaticLoader {
        StaticLoader::new()
            .with_resource("en/quotes.csv", EN_QUOTES)
            .with_resource("en/messages.json", EN_MESSAGES)
    }

    #[test]
    fn test_starts_uninitialized() {
        let mut controller = controller_with(full_loader());
        assert_eq!(controller.phase(), Phase::Uninitialized);
        assert!(controller.language().is_none());
        assert!(!controller.tick(at(9, 15, 0)), "ticks before a language is chosen do nothing");
    }

    #[tokio::test]
    async fn test_set_language_shows_quote() {
        let mut controller = controller_with(full_loader());
        controller.set_language(en(), at(9, 15, 30)).await.unwrap();

        assert_eq!(controller.phase(), Phase::Ready);
        assert_eq!(controller.last_key().unwrap().as_str(), "09:15");
        let display = controller.display();
        assert_eq!(display.source, "Daily Notes");
        assert_eq!(display.author, "J. Smith");
        assert_eq!(display.fragments[1], TextFragment::Bold("9:15 AM".to_string()));
    }

    #[tokio::test]
    async fn test_unsupported_language() {
        let mut controller = controller_with(full_loader());
        let result = controller.set_language(Language::from("fr"), at(9, 15, 0)).await;
        assert!(matches!(result, Err(ClockError::UnsupportedLanguage(_))));
        assert_eq!(controller.phase(), Phase::Uninitialized);
    }

    #[test]
    fn test_begin_language_shows_loading_message() {
        let mut controller = controller_with(full_loader());
        let needs_load = controller.begin_language(en(), at(9, 15, 0)).unwrap();

        assert!(needs_load);
        assert_eq!(controller.phase(), Phase::Loading);
        // Messages are not loaded yet either, so the built-in text is used
        assert_eq!(controller.display().text(), MessageKey::QuoteLoading.default_text());
        assert!(!controller.display().is_quote());
    }

    #[tokio::test]
    async fn test_cached_language_is_ready_immediately() {
        let mut controller = controller_with(full_loader());
        controller.set_language(en(), at(9, 15, 0)).await.unwrap();
        controller.set_language(Language::from("pt"), at(9, 15, 0)).await.unwrap();

        let needs_load = controller.begin_language(en(), at(9, 16, 0)).unwrap();
        assert!(!needs_load);
        assert_eq!(controller.phase(), Phase::Ready);
        assert_eq!(controller.display().author, "M. Reed");
    }

    #[tokio::test]
    async fn test_tick_same_minute_keeps_display() {
        let mut controller = controller_with(full_loader());
        controller.set_language(en(), at(9, 15, 0)).await.unwrap();

        assert!(!controller.tick(at(9, 15, 20)));
        let before = controller.display();
        assert!(!controller.tick(at(9, 15, 59)));
        assert!(Arc::ptr_eq(&before, &controller.display()));
    }

    #[tokio::test]
    async fn test_tick_new_minute_recomputes() {
        let mut controller = controller_with(full_loader());
        controller.set_language(en(), at(9, 15, 0)).await.unwrap();
        let before = controller.display();

        assert!(controller.tick(at(9, 16, 0)));
        assert!(!Arc::ptr_eq(&before, &controller.display()));
        assert_eq!(controller.display().author, "M. Reed");
        assert_eq!(controller.last_key().unwrap().as_str(), "09:16");
    }

    #[tokio::test]
    async fn test_missing_quote_uses_localized_message() {
        let mut controller = controller_with(full_loader());
        controller.set_language(en(), at(3, 0, 0)).await.unwrap();
        assert_eq!(controller.display().text(), "Silence at this minute.");
    }

    #[tokio::test]
    async fn test_unattributed_quote_is_still_a_quote() {
        let loader = StaticLoader::new().with_resource("en/quotes.csv", "11:11|=|11:11|=|At 11:11 she made a wish.|=||=|");
        let mut controller = controller_with(loader);
        controller.set_language(en(), at(11, 11, 0)).await.unwrap();

        let display = controller.display();
        assert!(display.is_quote());
        assert!(display.source.is_empty() && display.author.is_empty());
        assert_eq!(display.fragments[1], TextFragment::Bold("11:11".to_string()));
    }

    #[tokio::test]
    async fn test_missing_quote_and_messages_use_default() {
        let mut controller = controller_with(StaticLoader::new().with_resource("en/quotes.csv", EN_QUOTES));
        controller.set_language(en(), at(3, 0, 0)).await.unwrap();
        assert_eq!(controller.phase(), Phase::Ready);
        assert_eq!(controller.display().text(), MessageKey::NoQuoteFound.default_text());
    }

    #[tokio::test]
    async fn test_failed_loads_show_not_found() {
        let mut controller = controller_with(StaticLoader::new());
        controller.set_language(en(), at(9, 15, 0)).await.unwrap();
        assert_eq!(controller.phase(), Phase::Ready);
        assert_eq!(controller.display().text(), MessageKey::NoQuoteFound.default_text());
    }

    #[tokio::test]
    async fn test_reselecting_retries_failed_loads() {
        let loader = Arc::new(StaticLoader::new());
        let store = Arc::new(QuoteStore::new(loader.clone(), Box::new(FirstSelector)));
        let mut controller = DisplayController::new(store, ClockZone::Utc, vec![en()]);

        controller.set_language(en(), at(9, 15, 0)).await.unwrap();
        assert_eq!(loader.load_count(), 2);
        assert!(!controller.tick(at(9, 15, 30)));
        assert_eq!(loader.load_count(), 2, "ticks never retry");

        assert!(controller.begin_language(en(), at(9, 15, 40)).unwrap());
        assert_eq!(controller.phase(), Phase::Loading);
        controller.store().ensure_loaded(&en()).await;
        assert_eq!(loader.load_count(), 4);
    }

    #[tokio::test]
    async fn test_late_load_for_other_language_is_ignored() {
        let mut controller = controller_with(full_loader());
        assert!(controller.begin_language(en(), at(9, 15, 0)).unwrap());
        assert!(controller.begin_language(Language::from("pt"), at(9, 15, 0)).unwrap());

        // en finishes after pt was chosen
        controller.store().ensure_loaded(&en()).await;
        let before = controller.display();
        assert!(!controller.finish_loading(&en(), at(9, 15, 0)));

        assert!(Arc::ptr_eq(&before, &controller.display()));
        assert_eq!(controller.language(), Some(&Language::from("pt")));
        assert_eq!(controller.phase(), Phase::Loading);
        assert!(controller.store().is_loaded(&en()), "the cache is still populated");
    }

    #[tokio::test]
    async fn test_snapshot_reflects_state() {
        let mut controller = controller_with(full_loader());
        controller.set_language(en(), at(9, 15, 0)).await.unwrap();
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.language, Some(en()));
        assert_eq!(snapshot.phase, Phase::Ready);
        assert!(Arc::ptr_eq(&snapshot.display, &controller.display()));
    }
}
