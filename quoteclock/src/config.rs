//! Clock configuration
//!
//! Loaded from an optional JSON file; every field has a default, so an empty
//! object is a valid configuration:
//!
//! ```json
//! {
//!   "source": "https://example.com/quoteclock",
//!   "languages": ["en", "pt"],
//!   "default_language": "en",
//!   "timezone": "Europe/Lisbon",
//!   "selection": "random"
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::clock::ClockZone;
use crate::interface::Language;
use crate::selection::SelectionPolicy;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {message}")]
    Io { path: String, message: String },
    #[error("Invalid config: {0}")]
    Parse(String),
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
    #[error("Default language {0} is not in the supported languages")]
    DefaultLanguageNotSupported(Language),
    #[error("At least one language must be configured")]
    NoLanguages,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClockConfig {
    /// Base URL or directory holding `<lang>/quotes.csv` and `<lang>/messages.json`.
    /// `None` means the host decides (the CLI falls back to bundled data).
    pub source: Option<String>,
    /// Languages offered to the viewer, in display order
    pub languages: Vec<Language>,
    /// Language shown on startup
    pub default_language: Language,
    /// IANA zone name, `local` or `utc`. `None` reads the system zone.
    pub timezone: Option<String>,
    pub selection: SelectionPolicy,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            source: None,
            languages: vec![Language::from("en"), Language::from("pt")],
            default_language: Language::from("en"),
            timezone: None,
            selection: SelectionPolicy::default(),
        }
    }
}

impl ClockConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.languages.is_empty() {
            return Err(ConfigError::NoLanguages);
        }
        if !self.is_supported(&self.default_language) {
            return Err(ConfigError::DefaultLanguageNotSupported(self.default_language.clone()));
        }
        self.zone()?;
        Ok(())
    }

    pub fn is_supported(&self, language: &Language) -> bool {
        self.languages.contains(language)
    }

    pub fn zone(&self) -> Result<ClockZone, ConfigError> {
        match &self.timezone {
            Some(name) => name.parse(),
            None => Ok(ClockZone::Local),
        }
    }
}
