//! Asset identifiers.
//!
//! An asset is either a plain symbol served by a `BarProvider`, or a child
//! algorithm whose NAV curve is republished as a price series. Child
//! algorithms are identified by a process-unique `InstanceId`, never by name,
//! so two differently configured children sharing a name cannot collide.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one algorithm instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl InstanceId {
    /// Allocate a fresh id. Ids are never reused within a process.
    pub fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A tradable instrument.
///
/// Equality, ordering and hashing of `Algorithm` use the instance id only;
/// the name is carried for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AssetId {
    Symbol(String),
    Algorithm { id: InstanceId, name: String },
}

impl AssetId {
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Symbol(name.into())
    }

    pub fn is_algorithm(&self) -> bool {
        matches!(self, Self::Algorithm { .. })
    }

    /// Human-readable name (ticker, or algorithm name).
    pub fn name(&self) -> &str {
        match self {
            Self::Symbol(s) => s,
            Self::Algorithm { name, .. } => name,
        }
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self::Symbol(s.to_string())
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        Self::Symbol(s)
    }
}

impl PartialEq for AssetId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Algorithm { id: a, .. }, Self::Algorithm { id: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for AssetId {}

impl Hash for AssetId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Symbol(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            Self::Algorithm { id, .. } => {
                1u8.hash(state);
                id.hash(state);
            }
        }
    }
}

impl Ord for AssetId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Symbol(a), Self::Symbol(b)) => a.cmp(b),
            (Self::Algorithm { id: a, .. }, Self::Algorithm { id: b, .. }) => a.cmp(b),
            (Self::Symbol(_), Self::Algorithm { .. }) => Ordering::Less,
            (Self::Algorithm { .. }, Self::Symbol(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for AssetId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(s) => write!(f, "{s}"),
            Self::Algorithm { id, name } => write!(f, "algorithm:{name}{id}"),
        }
    }
}
