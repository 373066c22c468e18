//! Simulation engine: account ledger, order queue and the bar loop.
//!
//! Each bar runs in four phases (see `account`):
//!
//! 1. Close of `t`: expiry, cash and close-this-bar orders fill
//! 2. Overnight: held assets accrue to the open of `t+1`
//! 3. Open of `t+1`: open-next-bar orders fill
//! 4. Intraday: held assets accrue to the close of `t+1`, NAV bar emitted

pub mod account;
pub mod context;
pub mod error;
pub mod friction;
pub mod loop_runner;
pub mod market;
pub mod order_queue;
pub mod state;

pub use account::{Account, ALLOCATION_TOLERANCE, INITIAL_NAV};
pub use context::BarContext;
pub use error::SimError;
pub use friction::{CostModel, ExecutionPreset, FrictionModel, Frictionless};
pub use loop_runner::{run_simulation, run_simulation_in};
pub use market::{MarketData, PriceField};
pub use order_queue::OrderQueue;
pub use state::{DataGapPolicy, DateRange, RunResult, SimConfig};
