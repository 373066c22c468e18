//! Bar-by-bar simulation loop.
//!
//! For every calendar date, in order:
//! 1. the strategy's `on_bar` sees the date and may submit orders
//! 2. outside warm-up, the account executes queued orders and accrues returns
//!    through the next date's close
//!
//! A strategy error, a data gap under `DataGapPolicy::Abort`, or a computation
//! error stops the loop. The ledger as of the last fully processed bar is
//! returned with the reason in `RunResult::halt`.

use super::account::Account;
use super::context::BarContext;
use super::error::SimError;
use super::state::{DateRange, RunResult};
use crate::algorithm::Algorithm;
use crate::calendar::{warmup_start, TradingCalendar};
use crate::composition::AssetResolver;
use crate::data::BarProvider;
use tracing::{info, warn};

/// Run `algorithm` over its own configured range.
pub fn run_simulation(
    algorithm: &mut dyn Algorithm,
    provider: &dyn BarProvider,
) -> Result<RunResult, SimError> {
    run_simulation_in(algorithm, provider, &DateRange::unbounded())
}

/// Run `algorithm`, taking any range bound it leaves unset from `parent`.
///
/// Returns `Err` only for configuration problems detected before the first
/// bar; failures during the loop are reported through `RunResult::halt`.
pub fn run_simulation_in(
    algorithm: &mut dyn Algorithm,
    provider: &dyn BarProvider,
    parent: &DateRange,
) -> Result<RunResult, SimError> {
    let config = algorithm.config();
    let range = config.range.inherit(parent);
    let (start, end) = range.resolve()?;
    let name = algorithm.name().to_string();

    if warmup_start(start, config.warmup).is_none() {
        return Err(SimError::Configuration(format!(
            "{name}: warm-up of {} days before {start} is out of the supported date range",
            config.warmup.num_days()
        )));
    }

    let calendar = TradingCalendar::build(start, end, config.warmup, config.session.as_ref());
    if calendar.simulation_dates().is_empty() {
        return Err(SimError::Configuration(format!(
            "{name}: no {} trading dates between {start} and {end}",
            config.session.name()
        )));
    }
    info!(
        algorithm = %name,
        %start,
        %end,
        dates = calendar.len(),
        warmup_dates = calendar.warmup_dates().len(),
        provider = provider.name(),
        "simulation started"
    );

    algorithm.on_start(&calendar)?;

    let mut account = Account::new(config.friction.clone(), config.gap_policy);
    let mut resolver = AssetResolver::new(provider, range);
    let first_sim = calendar.first_sim_index();
    let dates = calendar.dates();

    let mut halt = None;
    let mut bars_processed = 0;
    let mut last_visited = dates[0];

    for (i, &date) in dates.iter().enumerate() {
        let next_date = dates.get(i + 1).copied();
        let warmup = i < first_sim;
        last_visited = date;
        if i == first_sim {
            account.open(date);
        }

        let mut ctx = BarContext::new(
            date,
            next_date,
            warmup,
            &calendar,
            &mut account,
            &mut resolver,
        );
        if let Err(e) = algorithm.on_bar(&mut ctx) {
            warn!(algorithm = %name, %date, error = %e, "strategy failed, halting run");
            halt = Some(e);
            break;
        }
        bars_processed += 1;

        if warmup {
            continue;
        }
        if let Err(e) = account.process_bar(date, next_date, &mut resolver) {
            warn!(algorithm = %name, %date, error = %e, "bar failed, halting run");
            halt = Some(e);
            break;
        }
    }

    account.finish(last_visited);
    info!(
        algorithm = %name,
        final_nav = account.net_asset_value(),
        trades = account.trade_log().len(),
        diagnostics = account.diagnostics().len(),
        children = resolver.simulated_children(),
        halted = halt.is_some(),
        "simulation finished"
    );

    Ok(RunResult {
        name,
        start,
        end,
        nav_bars: account.nav_bars().to_vec(),
        trade_log: account.trade_log().to_vec(),
        diagnostics: account.diagnostics().to_vec(),
        final_positions: account.positions().clone(),
        final_cash: account.cash(),
        final_nav: account.net_asset_value(),
        bars_processed,
        warmup_bars: first_sim,
        halt,
    })
}
