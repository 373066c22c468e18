//! navsim runner: configuration files, fingerprints and batch execution.
//!
//! This crate builds on `navsim-core` to provide:
//! - TOML run configuration with a content-addressed `RunId`
//! - BLAKE3 fingerprints of NAV series and trade logs
//! - Batch execution of independent runs, parallel via rayon

pub mod batch;
pub mod config;
pub mod fingerprint;

pub use batch::{BatchJob, BatchOutcome, BatchResults, BatchRunner};
pub use config::{
    CalendarKind, ConfigError, Configured, FrictionConfig, RunConfig, RunId, MAX_WARMUP_DAYS,
};
pub use fingerprint::RunFingerprint;
