//! Per-bar view handed to strategy logic.
//!
//! Replaces any notion of an ambient "current date": everything a strategy
//! may read or submit on a bar goes through this value.

use super::account::Account;
use super::error::SimError;
use super::market::MarketData;
use crate::calendar::TradingCalendar;
use crate::composition::{AssetResolver, ChildAlgorithm};
use crate::domain::{AssetId, Bar, Diagnostic, DiagnosticKind, OrderType};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub struct BarContext<'a, 'p> {
    date: NaiveDate,
    next_date: Option<NaiveDate>,
    warmup: bool,
    calendar: &'a TradingCalendar,
    account: &'a mut Account,
    resolver: &'a mut AssetResolver<'p>,
}

impl<'a, 'p> BarContext<'a, 'p> {
    pub(crate) fn new(
        date: NaiveDate,
        next_date: Option<NaiveDate>,
        warmup: bool,
        calendar: &'a TradingCalendar,
        account: &'a mut Account,
        resolver: &'a mut AssetResolver<'p>,
    ) -> Self {
        Self {
            date,
            next_date,
            warmup,
            calendar,
            account,
            resolver,
        }
    }

    // ── Time ───────────────────────────────────────────────────────────

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn next_date(&self) -> Option<NaiveDate> {
        self.next_date
    }

    /// True on the first simulated (non-warm-up) date.
    pub fn is_first_bar(&self) -> bool {
        self.calendar.simulation_dates().first() == Some(&self.date)
    }

    pub fn is_last_bar(&self) -> bool {
        self.next_date.is_none()
    }

    pub fn is_warmup(&self) -> bool {
        self.warmup
    }

    pub fn calendar(&self) -> &TradingCalendar {
        self.calendar
    }

    // ── Account ────────────────────────────────────────────────────────

    pub fn nav(&self) -> f64 {
        self.account.net_asset_value()
    }

    pub fn cash(&self) -> f64 {
        self.account.cash()
    }

    pub fn positions(&self) -> &BTreeMap<AssetId, f64> {
        self.account.positions()
    }

    pub fn allocation(&self, asset: &AssetId) -> f64 {
        self.account.allocation(asset)
    }

    // ── Market data ────────────────────────────────────────────────────

    /// Resolve a child algorithm to a tradable asset, simulating it on first use.
    pub fn asset(&mut self, child: &ChildAlgorithm) -> Result<AssetId, SimError> {
        self.resolver.resolve_child(child)
    }

    /// Today's bar of `asset`; `None` if there is none.
    pub fn bar(&mut self, asset: &AssetId) -> Result<Option<Bar>, SimError> {
        self.resolver.bar(asset, self.date)
    }

    pub fn close(&mut self, asset: &AssetId) -> Result<Option<f64>, SimError> {
        Ok(self.bar(asset)?.map(|b| b.close))
    }

    /// Up to `n` most recent bars of `asset` through today, oldest first.
    /// Calendar dates without a bar are skipped.
    pub fn history(&mut self, asset: &AssetId, n: usize) -> Result<Vec<Bar>, SimError> {
        let calendar = self.calendar;
        let Some(today) = calendar.index_of(self.date) else {
            return Ok(Vec::new());
        };
        let mut bars = Vec::with_capacity(n);
        for &date in calendar.dates()[..=today].iter().rev() {
            if bars.len() == n {
                break;
            }
            if let Some(bar) = self.resolver.bar(asset, date)? {
                bars.push(bar);
            }
        }
        bars.reverse();
        Ok(bars)
    }

    // ── Orders ─────────────────────────────────────────────────────────

    /// Queue an order moving `asset` to `weight` of NAV.
    ///
    /// Only `CloseThisBar` and `OpenNextBar` are accepted here. During
    /// warm-up the order is discarded with a diagnostic.
    pub fn allocate(
        &mut self,
        asset: &AssetId,
        weight: f64,
        order_type: OrderType,
    ) -> Result<(), SimError> {
        if matches!(order_type, OrderType::Cash | OrderType::Expiry) {
            return Err(SimError::Strategy(format!(
                "{order_type:?} orders cannot be submitted through allocate"
            )));
        }
        if self.discard_in_warmup(Some(asset)) {
            return Ok(());
        }
        self.account
            .submit_order(asset.clone(), weight, order_type, self.date)
    }

    /// Add `amount` currency to the account at today's close.
    pub fn deposit(&mut self, amount: f64) -> Result<(), SimError> {
        self.cash_order(-amount)
    }

    /// Remove `amount` currency from the account at today's close.
    pub fn withdraw(&mut self, amount: f64) -> Result<(), SimError> {
        self.cash_order(amount)
    }

    fn cash_order(&mut self, quantity: f64) -> Result<(), SimError> {
        if self.discard_in_warmup(None) {
            return Ok(());
        }
        self.account.submit_cash(quantity, self.date)
    }

    fn discard_in_warmup(&mut self, asset: Option<&AssetId>) -> bool {
        if !self.warmup {
            return false;
        }
        self.account.record_diagnostic(Diagnostic::new(
            self.date,
            DiagnosticKind::WarmupOrderDiscarded,
            asset.cloned(),
            "order submitted during warm-up discarded",
        ));
        true
    }
}
