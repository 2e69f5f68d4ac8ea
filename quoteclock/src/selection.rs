//! Choosing one quote when several share a time key

use rand::Rng;
use serde::Deserialize;

use crate::interface::{QuoteRecord, QuoteSelector};

/// Uniformly random pick, seeded from the thread RNG. The production default.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelector;

impl QuoteSelector for RandomSelector {
    fn select(&self, candidates: &[QuoteRecord]) -> usize {
        if candidates.len() <= 1 {
            return 0;
        }
        rand::thread_rng().gen_range(0..candidates.len())
    }
}

/// Always the first record in parse order
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstSelector;

impl QuoteSelector for FirstSelector {
    fn select(&self, _candidates: &[QuoteRecord]) -> usize {
        0
    }
}

/// Selection policy as named in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    #[default]
    Random,
    First,
}

impl SelectionPolicy {
    pub fn selector(self) -> Box<dyn QuoteSelector> {
        match self {
            SelectionPolicy::Random => Box::new(RandomSelector),
            SelectionPolicy::First => Box::new(FirstSelector),
        }
    }
}
