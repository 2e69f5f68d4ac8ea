//! QuoteClock Core - a clock that tells the time with quotes
//!
//! Every minute the clock shows a quote that mentions the current time, picked
//! from a per-language dataset keyed by `HH:MM`, with the time itself
//! emphasized inside the quote.
//!
//! # Architecture
//! - `fragment`: splits quote text around the time display (Normal/Bold runs)
//! - `dataset`: parses quote and message resources
//! - `store`: per-language cache, lazy concurrent loading, lookups
//! - `clock`: time keys, zones, minute-boundary delays
//! - `controller`: display state machine (language changes, ticks)
//! - `session`: single event loop + minute ticker feeding a view
//! - `loader`: HTTP, filesystem and in-memory resource loaders

pub mod clock;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod fragment;
pub mod interface;
pub mod loader;
pub mod models;
pub mod selection;
pub mod session;
pub mod store;
pub mod terminal;

pub use clock::{ClockZone, TimeKey};
pub use config::{ClockConfig, ConfigError};
pub use controller::DisplayController;
pub use interface::*;
pub use session::SessionHandle;
pub use store::QuoteStore;
