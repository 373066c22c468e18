//! Order tickets and receipts.
//!
//! A ticket records what the strategy asked for at submission time; a receipt
//! records what actually happened at execution time. Both are immutable once
//! created.

use super::asset::AssetId;
use super::log::LogAction;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Symbol carried by cash pseudo-order tickets.
pub const CASH_SYMBOL: &str = "$CASH";

/// Order timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Fill at this bar's close.
    CloseThisBar,
    /// Fill at the next bar's open.
    OpenNextBar,
    /// Deposit or withdrawal; adjusts NAV directly at this bar's close.
    Cash,
    /// Forced liquidation of an instrument with no further data.
    Expiry,
}

impl OrderType {
    /// True for order types that execute in the close phase of the current bar.
    pub fn executes_at_close(self) -> bool {
        !matches!(self, Self::OpenNextBar)
    }
}

/// Order information at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTicket {
    pub asset: AssetId,
    /// Target allocation as a fraction of NAV. For `Cash` tickets this is the
    /// currency quantity instead: positive withdraws, negative deposits.
    pub target_allocation: f64,
    pub order_type: OrderType,
    pub submit_date: NaiveDate,
}

impl OrderTicket {
    pub fn new(
        asset: AssetId,
        target_allocation: f64,
        order_type: OrderType,
        submit_date: NaiveDate,
    ) -> Self {
        Self {
            asset,
            target_allocation,
            order_type,
            submit_date,
        }
    }
}

/// Order information at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub ticket: OrderTicket,
    pub exec_date: NaiveDate,
    /// Order size, as a fraction of NAV.
    pub order_size: f64,
    pub fill_price: f64,
    /// Currency traded. Currency has no significance beyond readability.
    pub order_amount: f64,
    /// Currency lost to friction.
    pub friction_amount: f64,
    /// Net asset value at the moment of execution, before friction.
    pub net_asset_value: f64,
}

impl OrderReceipt {
    /// Display category of this trade.
    pub fn action(&self) -> LogAction {
        LogAction::classify(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_open_next_bar_waits_for_next_bar() {
        assert!(OrderType::CloseThisBar.executes_at_close());
        assert!(OrderType::Cash.executes_at_close());
        assert!(OrderType::Expiry.executes_at_close());
        assert!(!OrderType::OpenNextBar.executes_at_close());
    }

    #[test]
    fn order_type_serializes_snake_case() {
        let json = serde_json::to_string(&OrderType::OpenNextBar).unwrap();
        assert_eq!(json, "\"open_next_bar\"");
        let back: OrderType = serde_json::from_str("\"close_this_bar\"").unwrap();
        assert_eq!(back, OrderType::CloseThisBar);
    }
}
