//! QuoteClock Interface Definition
//!
//! Shared types between the core components and the hosts that embed them.
//! It acts as the source of truth for fragments, records, display state,
//! errors and the collaborator traits (loader, selector, clock).

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// A contiguous run of quote text, plain or emphasized
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TextFragment {
    Normal(String),
    Bold(String),
}

impl TextFragment {
    /// The text carried by this fragment, regardless of emphasis
    pub fn text(&self) -> &str {
        match self {
            TextFragment::Normal(text) => text,
            TextFragment::Bold(text) => text,
        }
    }

    pub fn is_bold(&self) -> bool {
        matches!(self, TextFragment::Bold(_))
    }
}

/// Where the display controller is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Loading,
    Ready,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS (Structs)
// ═══════════════════════════════════════════════════════════════════════════════

/// Language code selecting which pair of resources is shown (`"en"`, `"pt"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Language {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

/// One parsed line of a quote resource. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRecord {
    /// Literal time text as authored (e.g. "00:02 AM"), emphasized inside the quote
    pub time_display: String,
    /// Quote text split around case-insensitive occurrences of `time_display`
    pub fragments: Vec<TextFragment>,
    pub source: String,
    pub author: String,
}

impl QuoteRecord {
    /// The full quote text, reassembled from its fragments
    pub fn text(&self) -> String {
        concat_fragments(&self.fragments)
    }
}

/// Whether a display shows a quote or a system message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayKind {
    #[default]
    Message,
    Quote,
}

/// The value handed to views. Replaced wholesale on every update, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayState {
    pub kind: DisplayKind,
    pub fragments: Vec<TextFragment>,
    pub source: String,
    pub author: String,
}

impl DisplayState {
    /// A system message (loading, not found) shown in place of a quote
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            kind: DisplayKind::Message,
            fragments: vec![TextFragment::Normal(text.into())],
            source: String::new(),
            author: String::new(),
        }
    }

    pub fn from_record(record: &QuoteRecord) -> Self {
        Self {
            kind: DisplayKind::Quote,
            fragments: record.fragments.clone(),
            source: record.source.clone(),
            author: record.author.clone(),
        }
    }

    pub fn text(&self) -> String {
        concat_fragments(&self.fragments)
    }

    /// True for a quote, even one without attribution
    pub fn is_quote(&self) -> bool {
        self.kind == DisplayKind::Quote
    }
}

/// What a view receives from a running session
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub language: Option<Language>,
    pub phase: Phase,
    pub display: Arc<DisplayState>,
}

fn concat_fragments(fragments: &[TextFragment]) -> String {
    fragments.iter().map(TextFragment::text).collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Failure of a single resource load. Absorbed by the store, never fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unexpected status {status} for {location}")]
    Status { location: String, status: u16 },
    #[error("Network error: {0}")]
    Network(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Invalid resource location: {0}")]
    InvalidLocation(String),
}

/// Error type for QuoteClock operations
#[derive(Debug, Error)]
pub enum ClockError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(Language),
    #[error("Invalid time key: {0}")]
    InvalidTimeKey(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Session closed")]
    SessionClosed,
}

impl From<crate::config::ConfigError> for ClockError {
    fn from(e: crate::config::ConfigError) -> Self {
        ClockError::Config(e.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLABORATOR INTERFACES
// ═══════════════════════════════════════════════════════════════════════════════

/// Fetches a raw resource by its location relative to the loader's base.
/// No retry contract: a failure is reported once and the caller degrades.
#[async_trait::async_trait]
pub trait ResourceLoader: Send + Sync {
    async fn load(&self, location: &str) -> Result<String, LoadError>;
}

/// Chooses among several quotes sharing a time key.
/// `candidates` is never empty; the returned index must be in bounds.
pub trait QuoteSelector: Send + Sync {
    fn select(&self, candidates: &[QuoteRecord]) -> usize;
}

/// Source of "now", injectable so ticks can be driven from tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
