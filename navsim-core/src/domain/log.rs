//! Trade log classification.

use super::order::{OrderReceipt, OrderType};
use serde::{Deserialize, Serialize};

/// Display category of a trade log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogAction {
    Buy,
    Sell,
    Deposit,
    Withdrawal,
    Expiry,
}

impl LogAction {
    /// Derive the category from order type and the sign of the original quantity.
    ///
    /// Cash tickets carry their quantity in `target_allocation`: positive is a
    /// withdrawal, anything else a deposit. For trades the quantity is the
    /// executed order size.
    pub fn classify(receipt: &OrderReceipt) -> Self {
        match receipt.ticket.order_type {
            OrderType::Cash => {
                if receipt.ticket.target_allocation > 0.0 {
                    Self::Withdrawal
                } else {
                    Self::Deposit
                }
            }
            OrderType::Expiry => Self::Expiry,
            OrderType::CloseThisBar | OrderType::OpenNextBar => {
                if receipt.order_size > 0.0 {
                    Self::Buy
                } else {
                    Self::Sell
                }
            }
        }
    }
}
