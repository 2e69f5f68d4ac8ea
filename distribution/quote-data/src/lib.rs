//! Bundled sample resources for quoteclock
//!
//! Two languages, laid out the way a served resource tree is:
//! `<lang>/quotes.csv` and `<lang>/messages.json`.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Languages with bundled resources
pub const LANGUAGES: &[&str] = &["en", "pt"];

static RESOURCES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("en/quotes.csv", include_str!("../data/en/quotes.csv")),
        ("en/messages.json", include_str!("../data/en/messages.json")),
        ("pt/quotes.csv", include_str!("../data/pt/quotes.csv")),
        ("pt/messages.json", include_str!("../data/pt/messages.json")),
    ])
});

/// Content of a bundled resource by its relative location
pub fn resource(location: &str) -> Option<&'static str> {
    RESOURCES.get(location).copied()
}

/// Every bundled resource as `(location, content)`
pub fn resources() -> impl Iterator<Item = (&'static str, &'static str)> {
    RESOURCES.iter().map(|(location, content)| (*location, *content))
}
