//! Bar data sources.
//!
//! Retrieval and caching of real price data live outside this crate. What is
//! here is the pull-style `BarProvider` seam, an in-memory implementation,
//! and a seeded synthetic generator for tests and benches.

pub mod provider;
pub mod synthetic;

pub use provider::{BarProvider, DataError, InMemoryProvider};
pub use synthetic::{random_walk, SyntheticConfig};
