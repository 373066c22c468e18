//! Engine error types.

use crate::composition::CompositionError;
use crate::data::DataError;
use crate::domain::AssetId;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while configuring or running a simulation.
///
/// `UnknownAsset` and (under `DataGapPolicy::CarryForward`) `DataGap` are
/// recovered inside the account and only show up as diagnostics. Everything
/// else halts the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unknown asset: {asset}")]
    UnknownAsset { asset: AssetId },

    #[error("data gap: no bar for {asset} on {date}")]
    DataGap { asset: AssetId, date: NaiveDate },

    #[error("computation error: {0}")]
    Computation(String),

    #[error(transparent)]
    Composition(#[from] CompositionError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("strategy error: {0}")]
    Strategy(String),
}

impl SimError {
    /// True for errors the account absorbs without halting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownAsset { .. })
    }
}
