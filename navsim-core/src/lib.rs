//! navsim core: daily-bar backtesting ledger with algorithm-as-asset composition.
//!
//! This crate contains:
//! - Domain types (bars, asset ids, order tickets and receipts, diagnostics)
//! - Trading calendar generation with NYSE and weekday session predicates
//! - The account ledger: target-allocation orders, two order timings,
//!   friction, cash movements, expiry, NAV bars
//! - The bar-by-bar simulation loop with warm-up
//! - Composition: strategies traded as assets inside other strategies
//! - In-memory and seeded synthetic bar providers

pub mod algorithm;
pub mod calendar;
pub mod composition;
pub mod data;
pub mod domain;
pub mod engine;

pub use algorithm::Algorithm;
pub use calendar::{NyseCalendar, SessionCalendar, TradingCalendar, WeekdayCalendar};
pub use composition::{ChildAlgorithm, CompositionError};
pub use data::{BarProvider, DataError, InMemoryProvider};
pub use domain::{AssetId, Bar, LogAction, OrderReceipt, OrderType};
pub use engine::{run_simulation, run_simulation_in, BarContext, DataGapPolicy, SimConfig, SimError};
