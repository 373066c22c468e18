//! Account: the per-run ledger of positions, cash and net asset value.
//!
//! Positions and cash are fractions of NAV and always sum to one. NAV starts
//! at `INITIAL_NAV` currency units; currency has no meaning beyond making the
//! numbers tangible.
//!
//! `process_bar(t, t+1)` runs four phases:
//! 1. expiry, cash and close-this-bar tickets execute at the close of `t`
//! 2. held assets accrue their return from the last mark to the open of `t+1`
//! 3. open-next-bar tickets execute at the open of `t+1`
//! 4. held assets accrue to the close of `t+1`; the NAV bar of `t+1` is emitted
//!
//! An order submitted on `t` therefore never touches the return already
//! realized on `t`.

use super::error::SimError;
use super::friction::FrictionModel;
use super::market::{fetch_price, MarketData, PriceField};
use super::order_queue::OrderQueue;
use super::state::DataGapPolicy;
use crate::domain::{
    AssetId, Bar, Diagnostic, DiagnosticKind, OrderReceipt, OrderTicket, OrderType, CASH_SYMBOL,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// NAV at the start of every run.
pub const INITIAL_NAV: f64 = 1_000.0;

/// Maximum deviation of `sum(positions) + cash` from one.
pub const ALLOCATION_TOLERANCE: f64 = 1e-9;

/// Orders smaller than this (fraction of NAV) are consumed without a receipt.
const MIN_ORDER_SIZE: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct Account {
    nav: f64,
    cash: f64,
    /// BTreeMap: summation order must not depend on hashing.
    positions: BTreeMap<AssetId, f64>,
    /// Price each held asset was last valued at.
    marks: BTreeMap<AssetId, f64>,
    queue: OrderQueue,
    trade_log: Vec<OrderReceipt>,
    diagnostics: Vec<Diagnostic>,
    nav_bars: Vec<Bar>,
    friction: Arc<dyn FrictionModel>,
    gap_policy: DataGapPolicy,
}

/// Ledger state at a bar boundary, restored when a bar fails midway.
struct Checkpoint {
    nav: f64,
    cash: f64,
    positions: BTreeMap<AssetId, f64>,
    marks: BTreeMap<AssetId, f64>,
    queue: OrderQueue,
    trade_log_len: usize,
    diagnostics_len: usize,
    nav_bars_len: usize,
    last_nav_bar: Option<Bar>,
}

impl Account {
    pub fn new(friction: Arc<dyn FrictionModel>, gap_policy: DataGapPolicy) -> Self {
        Self {
            nav: INITIAL_NAV,
            cash: 1.0,
            positions: BTreeMap::new(),
            marks: BTreeMap::new(),
            queue: OrderQueue::new(),
            trade_log: Vec::new(),
            diagnostics: Vec::new(),
            nav_bars: Vec::new(),
            friction,
            gap_policy,
        }
    }

    // ── Read access ────────────────────────────────────────────────────

    pub fn net_asset_value(&self) -> f64 {
        self.nav
    }

    /// Cash as a fraction of NAV.
    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Positions as fractions of NAV.
    pub fn positions(&self) -> &BTreeMap<AssetId, f64> {
        &self.positions
    }

    /// Current allocation of `asset`, zero if not held.
    pub fn allocation(&self, asset: &AssetId) -> f64 {
        self.positions.get(asset).copied().unwrap_or(0.0)
    }

    pub fn pending_orders(&self) -> &[OrderTicket] {
        self.queue.pending()
    }

    pub fn trade_log(&self) -> &[OrderReceipt] {
        &self.trade_log
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn nav_bars(&self) -> &[Bar] {
        &self.nav_bars
    }

    /// `|sum(positions) + cash - 1|`.
    pub fn allocation_error(&self) -> f64 {
        (self.positions.values().sum::<f64>() + self.cash - 1.0).abs()
    }

    // ── Order submission ───────────────────────────────────────────────

    /// Queue a target-allocation order. Positions are not touched until the
    /// order executes.
    pub fn submit_order(
        &mut self,
        asset: AssetId,
        target_allocation: f64,
        order_type: OrderType,
        submit_date: NaiveDate,
    ) -> Result<(), SimError> {
        if !target_allocation.is_finite() {
            return Err(SimError::Computation(format!(
                "{asset}: non-finite target allocation {target_allocation}"
            )));
        }
        let replaced = self.queue.submit(OrderTicket::new(
            asset,
            target_allocation,
            order_type,
            submit_date,
        ));
        if replaced > 0 {
            debug!(%submit_date, replaced, "order overrides earlier same-day submission");
        }
        Ok(())
    }

    /// Queue a cash pseudo-order: positive `amount` withdraws, negative deposits.
    pub fn submit_cash(&mut self, amount: f64, submit_date: NaiveDate) -> Result<(), SimError> {
        self.submit_order(AssetId::symbol(CASH_SYMBOL), amount, OrderType::Cash, submit_date)
    }

    pub(crate) fn record_diagnostic(&mut self, diagnostic: Diagnostic) {
        warn!(
            date = %diagnostic.date,
            kind = ?diagnostic.kind,
            "{}",
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }

    // ── Bar processing ─────────────────────────────────────────────────

    /// Emit the opening NAV bar on the first simulated date.
    pub fn open(&mut self, date: NaiveDate) {
        if self.nav_bars.is_empty() {
            self.nav_bars.push(Bar::flat(date, self.nav));
        }
    }

    /// Execute queued orders and accrue returns from the close of `date`
    /// through the close of `next_date`.
    ///
    /// On error the ledger is left exactly as it was before the call.
    pub fn process_bar(
        &mut self,
        date: NaiveDate,
        next_date: Option<NaiveDate>,
        market: &mut dyn MarketData,
    ) -> Result<(), SimError> {
        let checkpoint = self.checkpoint();
        let result = self.process_bar_phases(date, next_date, market);
        if result.is_err() {
            self.restore(checkpoint);
        }
        result
    }

    /// Report every ticket still queued at the end of the run.
    pub fn finish(&mut self, date: NaiveDate) {
        for ticket in self.queue.drain() {
            self.record_diagnostic(Diagnostic::new(
                date,
                DiagnosticKind::OrderNotExecuted,
                Some(ticket.asset.clone()),
                format!(
                    "{:?} order for {} submitted {} never executed",
                    ticket.order_type, ticket.asset, ticket.submit_date
                ),
            ));
        }
    }

    fn process_bar_phases(
        &mut self,
        date: NaiveDate,
        next_date: Option<NaiveDate>,
        market: &mut dyn MarketData,
    ) -> Result<(), SimError> {
        self.open(date);

        // Phase 1: close of `date`.
        self.queue_expiries(date, next_date, market)?;
        for ticket in self.queue.take_where(|t| t.order_type.executes_at_close()) {
            self.execute(ticket, date, PriceField::Close, market)?;
        }
        self.amend_last_nav_bar();
        self.verify_ledger()?;

        let Some(next) = next_date else {
            return Ok(());
        };

        // Phase 2: overnight.
        self.accrue(next, PriceField::Open, market)?;
        let open_nav = self.nav;

        // Phase 3: open of `next`.
        for ticket in self.queue.take_where(|t| t.order_type == OrderType::OpenNextBar) {
            self.execute(ticket, next, PriceField::Open, market)?;
        }
        let traded_nav = self.nav;

        // Phase 4: intraday.
        self.accrue(next, PriceField::Close, market)?;
        self.nav_bars.push(Bar {
            date: next,
            open: open_nav,
            high: open_nav.max(traded_nav).max(self.nav),
            low: open_nav.min(traded_nav).min(self.nav),
            close: self.nav,
            volume: 0,
        });
        self.verify_ledger()
    }

    /// Liquidate held assets whose data ends today while the run continues.
    fn queue_expiries(
        &mut self,
        date: NaiveDate,
        next_date: Option<NaiveDate>,
        market: &mut dyn MarketData,
    ) -> Result<(), SimError> {
        if next_date.is_none() {
            return Ok(());
        }
        let held: Vec<AssetId> = self.positions.keys().cloned().collect();
        for asset in held {
            match market.last_date(&asset) {
                Ok(Some(last)) if last == date => {
                    debug!(%asset, %date, "no data after today, queueing expiry");
                    let superseded = self.queue.force(OrderTicket::new(
                        asset.clone(),
                        0.0,
                        OrderType::Expiry,
                        date,
                    ));
                    for ticket in superseded {
                        self.record_diagnostic(Diagnostic::new(
                            date,
                            DiagnosticKind::OrderNotExecuted,
                            Some(asset.clone()),
                            format!(
                                "{:?} order superseded by expiry of {asset}",
                                ticket.order_type
                            ),
                        ));
                    }
                }
                Ok(_) => {}
                Err(e) if e.is_recoverable() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn execute(
        &mut self,
        ticket: OrderTicket,
        exec_date: NaiveDate,
        field: PriceField,
        market: &mut dyn MarketData,
    ) -> Result<(), SimError> {
        match ticket.order_type {
            OrderType::Cash => self.execute_cash(ticket, exec_date),
            _ => self.execute_trade(ticket, exec_date, field, market),
        }
    }

    fn execute_trade(
        &mut self,
        ticket: OrderTicket,
        exec_date: NaiveDate,
        field: PriceField,
        market: &mut dyn MarketData,
    ) -> Result<(), SimError> {
        let asset = ticket.asset.clone();
        let fill_price = match fetch_price(market, &asset, exec_date, field) {
            Ok(Some(price)) => price,
            Ok(None) if ticket.order_type == OrderType::Expiry => {
                match self.marks.get(&asset) {
                    Some(&mark) => mark,
                    None => return Ok(()),
                }
            }
            Ok(None) => return self.handle_gap(&asset, exec_date, "order dropped"),
            Err(e) if e.is_recoverable() => {
                self.record_diagnostic(Diagnostic::new(
                    exec_date,
                    DiagnosticKind::UnknownAsset,
                    Some(asset),
                    format!("order dropped: {e}"),
                ));
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let target = match ticket.order_type {
            OrderType::Expiry => 0.0,
            _ => ticket.target_allocation,
        };
        let order_size = target - self.allocation(&asset);
        if order_size.abs() < MIN_ORDER_SIZE {
            return Ok(());
        }

        let friction = self.friction.cost(order_size, fill_price);
        if !friction.is_finite() || friction < 0.0 {
            return Err(SimError::Computation(format!(
                "{asset}: friction model returned {friction}"
            )));
        }

        let nav_before = self.nav;
        if target == 0.0 {
            self.positions.remove(&asset);
            self.marks.remove(&asset);
        } else {
            self.positions.insert(asset.clone(), target);
            self.marks.insert(asset.clone(), fill_price);
        }
        self.cash -= order_size;

        let friction_amount = friction * nav_before;
        if friction_amount > 0.0 {
            self.rebase_nav(nav_before - friction_amount)?;
        }

        debug!(
            %asset,
            %exec_date,
            order_size,
            fill_price,
            friction_amount,
            "order executed"
        );
        self.trade_log.push(OrderReceipt {
            ticket,
            exec_date,
            order_size,
            fill_price,
            order_amount: order_size * nav_before,
            friction_amount,
            net_asset_value: nav_before,
        });
        Ok(())
    }

    /// Cash orders move NAV directly; held positions keep their currency value.
    fn execute_cash(&mut self, ticket: OrderTicket, exec_date: NaiveDate) -> Result<(), SimError> {
        let amount = ticket.target_allocation;
        let nav_before = self.nav;
        let nav_after = nav_before - amount;
        if nav_after <= 0.0 {
            self.record_diagnostic(Diagnostic::new(
                exec_date,
                DiagnosticKind::InvalidOrder,
                None,
                format!("withdrawal of {amount} exceeds net asset value {nav_before}"),
            ));
            return Ok(());
        }
        self.rebase_nav(nav_after)?;

        debug!(%exec_date, amount, "cash order executed");
        self.trade_log.push(OrderReceipt {
            ticket,
            exec_date,
            order_size: amount / nav_before,
            fill_price: 1.0,
            order_amount: amount,
            friction_amount: 0.0,
            net_asset_value: nav_before,
        });
        Ok(())
    }

    /// Accrue every held asset's return from its mark to `field` of `date`.
    ///
    /// `NAV *= 1 + sum(w_i * r_i)`; weights drift with their own returns.
    fn accrue(
        &mut self,
        date: NaiveDate,
        field: PriceField,
        market: &mut dyn MarketData,
    ) -> Result<(), SimError> {
        let held: Vec<(AssetId, f64)> = self
            .positions
            .iter()
            .map(|(asset, weight)| (asset.clone(), *weight))
            .collect();

        let mut moves: BTreeMap<AssetId, (f64, f64)> = BTreeMap::new();
        let mut portfolio_return = 0.0;
        for (asset, weight) in held {
            let Some(&mark) = self.marks.get(&asset) else {
                continue;
            };
            let price = match fetch_price(market, &asset, date, field) {
                Ok(Some(price)) => price,
                Ok(None) => {
                    self.handle_gap(&asset, date, "carrying last price forward")?;
                    continue;
                }
                Err(e) if e.is_recoverable() => {
                    self.handle_gap(&asset, date, "asset no longer resolvable")?;
                    continue;
                }
                Err(e) => return Err(e),
            };
            let asset_return = price / mark - 1.0;
            portfolio_return += weight * asset_return;
            moves.insert(asset, (asset_return, price));
        }

        let growth = 1.0 + portfolio_return;
        if !growth.is_finite() || growth <= 0.0 {
            return Err(SimError::Computation(format!(
                "portfolio growth factor {growth} on {date}"
            )));
        }

        self.nav *= growth;
        for (asset, weight) in self.positions.iter_mut() {
            let asset_return = moves.get(asset).map_or(0.0, |(r, _)| *r);
            *weight = *weight * (1.0 + asset_return) / growth;
        }
        for (asset, (_, price)) in moves {
            self.marks.insert(asset, price);
        }
        self.cash /= growth;
        Ok(())
    }

    fn handle_gap(&mut self, asset: &AssetId, date: NaiveDate, action: &str) -> Result<(), SimError> {
        match self.gap_policy {
            DataGapPolicy::Abort => Err(SimError::DataGap {
                asset: asset.clone(),
                date,
            }),
            DataGapPolicy::CarryForward => {
                self.record_diagnostic(Diagnostic::new(
                    date,
                    DiagnosticKind::DataGap,
                    Some(asset.clone()),
                    format!("no bar for {asset} on {date}: {action}"),
                ));
                Ok(())
            }
        }
    }

    /// Change NAV without changing the currency value of any position.
    fn rebase_nav(&mut self, new_nav: f64) -> Result<(), SimError> {
        if !new_nav.is_finite() || new_nav <= 0.0 {
            return Err(SimError::Computation(format!(
                "net asset value would become {new_nav}"
            )));
        }
        let ratio = self.nav / new_nav;
        for weight in self.positions.values_mut() {
            *weight *= ratio;
        }
        self.cash = 1.0 - self.positions.values().sum::<f64>();
        self.nav = new_nav;
        Ok(())
    }

    fn amend_last_nav_bar(&mut self) {
        let nav = self.nav;
        if let Some(bar) = self.nav_bars.last_mut() {
            bar.close = nav;
            bar.high = bar.high.max(nav);
            bar.low = bar.low.min(nav);
        }
    }

    fn verify_ledger(&self) -> Result<(), SimError> {
        if !self.nav.is_finite() || self.nav <= 0.0 {
            return Err(SimError::Computation(format!(
                "net asset value is {}",
                self.nav
            )));
        }
        let error = self.allocation_error();
        if !(error <= ALLOCATION_TOLERANCE) {
            return Err(SimError::Computation(format!(
                "positions + cash deviate from 1 by {error}"
            )));
        }
        Ok(())
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            nav: self.nav,
            cash: self.cash,
            positions: self.positions.clone(),
            marks: self.marks.clone(),
            queue: self.queue.clone(),
            trade_log_len: self.trade_log.len(),
            diagnostics_len: self.diagnostics.len(),
            nav_bars_len: self.nav_bars.len(),
            last_nav_bar: self.nav_bars.last().cloned(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.nav = checkpoint.nav;
        self.cash = checkpoint.cash;
        self.positions = checkpoint.positions;
        self.marks = checkpoint.marks;
        self.queue = checkpoint.queue;
        self.trade_log.truncate(checkpoint.trade_log_len);
        self.diagnostics.truncate(checkpoint.diagnostics_len);
        self.nav_bars.truncate(checkpoint.nav_bars_len);
        if let (Some(bar), Some(saved)) = (self.nav_bars.last_mut(), checkpoint.last_nav_bar) {
            *bar = saved;
        }
    }
}
