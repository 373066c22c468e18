//! Algorithm-as-asset composition.
//!
//! A `ChildAlgorithm` is a shareable handle to a fully configured strategy.
//! When a parent references it through `BarContext::asset`, the parent run's
//! `AssetResolver` simulates the child once, memoizes its NAV curve as a
//! `ChildSeries`, and serves that curve as the child's price bars for the rest
//! of the run. Memoization is keyed by the handle's `InstanceId`.

pub mod child;
pub mod resolver;

pub use child::ChildAlgorithm;
pub use resolver::{AssetResolver, ChildSeries};

use crate::engine::SimError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompositionError {
    #[error("algorithm {name} references itself while it is being simulated")]
    Cycle { name: String },

    #[error("algorithm {name} panicked in an earlier simulation and cannot be reused")]
    Poisoned { name: String },

    #[error("child algorithm {name} failed: {error}")]
    ChildFailed {
        name: String,
        #[source]
        error: Box<SimError>,
    },
}
