//! Content hashes of run outputs.
//!
//! Two runs with equal fingerprints produced byte-identical NAV series and
//! trade logs. Used to check determinism across sequential and parallel
//! execution.

use navsim_core::engine::RunResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunFingerprint {
    /// BLAKE3 of the JSON-encoded NAV bars.
    pub nav: String,
    /// BLAKE3 of the JSON-encoded trade log.
    pub trades: String,
}

impl RunFingerprint {
    pub fn of(result: &RunResult) -> Result<Self, serde_json::Error> {
        Ok(Self {
            nav: hash_json(&result.nav_bars)?,
            trades: hash_json(&result.trade_log)?,
        })
    }

    /// Single hash over both components.
    pub fn combined(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.nav.as_bytes());
        hasher.update(self.trades.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

fn hash_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(value)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
