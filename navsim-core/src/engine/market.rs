//! Account-facing view of market data.

use super::error::SimError;
use crate::domain::{AssetId, Bar};
use chrono::NaiveDate;

/// Which price of a bar an order fills at or a return accrues to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Open,
    Close,
}

impl PriceField {
    pub fn of(self, bar: &Bar) -> f64 {
        match self {
            Self::Open => bar.open,
            Self::Close => bar.close,
        }
    }
}

/// Bars for any asset the account may hold, symbols and child algorithms alike.
///
/// Lookups take `&mut self` because resolving a child algorithm for the first
/// time runs its simulation.
pub trait MarketData {
    /// `Ok(None)` is a gap; `Err(SimError::UnknownAsset)` means unresolvable.
    fn bar(&mut self, asset: &AssetId, date: NaiveDate) -> Result<Option<Bar>, SimError>;

    /// Date of the last bar available for `asset`.
    fn last_date(&mut self, asset: &AssetId) -> Result<Option<NaiveDate>, SimError>;
}

/// Fetch one price, validating it is usable for return arithmetic.
pub(crate) fn fetch_price(
    market: &mut dyn MarketData,
    asset: &AssetId,
    date: NaiveDate,
    field: PriceField,
) -> Result<Option<f64>, SimError> {
    let Some(bar) = market.bar(asset, date)? else {
        return Ok(None);
    };
    let price = field.of(&bar);
    if !price.is_finite() || price <= 0.0 {
        return Err(SimError::Computation(format!(
            "{asset}: unusable price {price} on {date}"
        )));
    }
    Ok(Some(price))
}
