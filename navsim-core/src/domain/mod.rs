//! Domain types for navsim

pub mod asset;
pub mod bar;
pub mod diagnostic;
pub mod log;
pub mod order;

pub use asset::{AssetId, InstanceId};
pub use bar::Bar;
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use log::LogAction;
pub use order::{OrderReceipt, OrderTicket, OrderType, CASH_SYMBOL};
