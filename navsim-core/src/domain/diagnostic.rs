//! Diagnostic log entries for recovered (non-fatal) faults.

use super::asset::AssetId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Order referenced an instrument no data source can resolve.
    UnknownAsset,
    /// A bar was needed on a date the data source has none for.
    DataGap,
    /// Order was still queued when the simulation ended.
    OrderNotExecuted,
    /// Order submitted during the warm-up window.
    WarmupOrderDiscarded,
    /// Order rejected at execution time (e.g. withdrawal exceeding NAV).
    InvalidOrder,
}

/// One diagnostic entry, kept for post-run inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub date: NaiveDate,
    pub kind: DiagnosticKind,
    pub asset: Option<AssetId>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        date: NaiveDate,
        kind: DiagnosticKind,
        asset: Option<AssetId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            date,
            kind,
            asset,
            message: message.into(),
        }
    }
}
