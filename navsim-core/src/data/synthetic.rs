//! Seeded synthetic bars.
//!
//! Each symbol gets its own `StdRng` whose seed is derived from the master
//! seed and the symbol name via BLAKE3, so series do not depend on the order
//! in which symbols are generated.

use super::provider::{DataError, InMemoryProvider};
use crate::domain::Bar;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Parameters of the random walk.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub start_price: f64,
    /// Maximum absolute close-to-close move, as a fraction.
    pub max_daily_move: f64,
    /// Drift added to every close-to-close move.
    pub drift: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            start_price: 100.0,
            max_daily_move: 0.02,
            drift: 0.0002,
        }
    }
}

impl SyntheticConfig {
    /// Deterministic per-symbol seed.
    pub fn sub_seed(&self, symbol: &str) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Build an in-memory provider with one random walk per symbol.
    pub fn provider(&self, symbols: &[&str], dates: &[NaiveDate]) -> Result<InMemoryProvider, DataError> {
        let mut provider = InMemoryProvider::new();
        for symbol in symbols {
            provider.insert(symbol, random_walk(self, symbol, dates))?;
        }
        Ok(provider)
    }
}

/// One bar per date: overnight gap, intraday move, and a range around both.
pub fn random_walk(config: &SyntheticConfig, symbol: &str, dates: &[NaiveDate]) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(config.sub_seed(symbol));
    let half = config.max_daily_move / 2.0;
    let mut prev_close = config.start_price;

    dates
        .iter()
        .map(|&date| {
            let gap: f64 = rng.gen_range(-half..=half);
            let move_: f64 = rng.gen_range(-half..=half) + config.drift;
            let open = (prev_close * (1.0 + gap)).max(0.01);
            let close = (open * (1.0 + move_)).max(0.01);
            let wick: f64 = rng.gen_range(0.0..=half);
            let high = open.max(close) * (1.0 + wick);
            let low = open.min(close) * (1.0 - wick);
            let volume = rng.gen_range(100_000..5_000_000);
            prev_close = close;
            Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            }
        })
        .collect()
}
