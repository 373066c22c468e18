//! Integration tests for algorithm-as-asset composition.
//!
//! Tests:
//! 1. A parent fully invested in a 60/40 child reproduces the child's NAV curve
//! 2. A child is simulated once per parent run, however often it is referenced
//! 3. Child range bounds are inherited field-wise from the parent
//! 4. Distinct instances are distinct assets; the child trade log stays private
//! 5. A child referencing itself fails with a cycle error instead of deadlocking
//! 6. A handle shared by parents on different threads is run once per parent

use chrono::{Duration, NaiveDate};
use navsim_core::calendar::{NyseCalendar, TradingCalendar};
use navsim_core::composition::{ChildAlgorithm, CompositionError};
use navsim_core::data::{InMemoryProvider, SyntheticConfig};
use navsim_core::domain::{AssetId, LogAction, OrderType};
use navsim_core::engine::{
    run_simulation, run_simulation_in, BarContext, DateRange, ExecutionPreset, SimConfig,
    SimError,
};
use navsim_core::Algorithm;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn provider() -> InMemoryProvider {
    let cal = TradingCalendar::build(date(2019, 11, 1), date(2020, 12, 31), Duration::zero(), &NyseCalendar);
    SyntheticConfig {
        seed: 7,
        ..SyntheticConfig::default()
    }
    .provider(&["SPY", "AGG"], cal.dates())
    .unwrap()
}

fn year_2020() -> DateRange {
    DateRange::new(date(2020, 1, 1), date(2020, 12, 31))
}

/// 60% SPY / 40% AGG, rebalanced every 21 sessions.
struct SixtyForty {
    range: DateRange,
    preset: ExecutionPreset,
    runs: Arc<AtomicUsize>,
    bar: usize,
}

impl SixtyForty {
    fn new(range: DateRange) -> Self {
        Self {
            range,
            preset: ExecutionPreset::Frictionless,
            runs: Arc::new(AtomicUsize::new(0)),
            bar: 0,
        }
    }
}

impl Algorithm for SixtyForty {
    fn name(&self) -> &str {
        "sixty_forty"
    }

    fn config(&self) -> SimConfig {
        SimConfig::with_range(self.range).preset(self.preset)
    }

    fn on_start(&mut self, _calendar: &TradingCalendar) -> Result<(), SimError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.bar = 0;
        Ok(())
    }

    fn on_bar(&mut self, ctx: &mut BarContext<'_, '_>) -> Result<(), SimError> {
        if self.bar % 21 == 0 {
            ctx.allocate(&AssetId::symbol("SPY"), 0.6, OrderType::CloseThisBar)?;
            ctx.allocate(&AssetId::symbol("AGG"), 0.4, OrderType::CloseThisBar)?;
        }
        self.bar += 1;
        Ok(())
    }
}

/// Holds `weight` of each child from the first bar, re-resolving every bar.
struct FundOfFunds {
    range: DateRange,
    children: Vec<(ChildAlgorithm, f64)>,
}

impl Algorithm for FundOfFunds {
    fn name(&self) -> &str {
        "fund_of_funds"
    }

    fn config(&self) -> SimConfig {
        SimConfig::with_range(self.range)
    }

    fn on_bar(&mut self, ctx: &mut BarContext<'_, '_>) -> Result<(), SimError> {
        for (child, weight) in &self.children {
            let asset = ctx.asset(child)?;
            if ctx.is_first_bar() {
                ctx.allocate(&asset, *weight, OrderType::CloseThisBar)?;
            }
        }
        Ok(())
    }
}

// ──────────────────────────────────────────────
// 1. NAV reproduction
// ──────────────────────────────────────────────

#[test]
fn parent_fully_in_child_reproduces_child_curve() {
    let provider = provider();

    let standalone = run_simulation(&mut SixtyForty::new(year_2020()), &provider).unwrap();
    assert!(standalone.is_complete());

    let child = ChildAlgorithm::new(SixtyForty::new(DateRange::unbounded()));
    let mut parent = FundOfFunds {
        range: year_2020(),
        children: vec![(child, 1.0)],
    };
    let result = run_simulation(&mut parent, &provider).unwrap();
    assert!(result.is_complete());

    let parent_curve = result.nav_curve();
    let child_curve = standalone.nav_curve();
    assert_eq!(parent_curve.len(), child_curve.len());
    for (p, c) in parent_curve.iter().zip(&child_curve) {
        assert!(((p - c) / c).abs() < 1e-9, "parent {p} vs child {c}");
    }
}

#[test]
fn child_friction_shows_up_as_child_return() {
    let provider = provider();
    let mut costly = SixtyForty::new(year_2020());
    costly.preset = ExecutionPreset::Realistic;
    let standalone = run_simulation(&mut costly, &provider).unwrap();

    let mut child_algo = SixtyForty::new(DateRange::unbounded());
    child_algo.preset = ExecutionPreset::Realistic;
    let mut parent = FundOfFunds {
        range: year_2020(),
        children: vec![(ChildAlgorithm::new(child_algo), 1.0)],
    };
    let result = run_simulation(&mut parent, &provider).unwrap();

    // The parent buys at the child's post-friction close, so the curves
    // agree once both are normalized to their first close.
    let parent_curve = result.nav_curve();
    let child_curve = standalone.nav_curve();
    assert!(child_curve[0] < parent_curve[0]);
    for (p, c) in parent_curve.iter().zip(&child_curve) {
        let (p, c) = (p / parent_curve[0], c / child_curve[0]);
        assert!(((p - c) / c).abs() < 1e-9);
    }
}

#[test]
fn parent_sees_only_child_nav_not_its_trades() {
    let provider = provider();
    let child = ChildAlgorithm::new(SixtyForty::new(DateRange::unbounded()));
    let mut parent = FundOfFunds {
        range: year_2020(),
        children: vec![(child.clone(), 0.5)],
    };
    let result = run_simulation(&mut parent, &provider).unwrap();

    assert_eq!(result.trade_log.len(), 1);
    assert_eq!(result.trade_log[0].ticket.asset, child.asset_id());
    assert_eq!(result.trade_log[0].action(), LogAction::Buy);
    assert!(result
        .final_positions
        .keys()
        .all(|asset| asset.is_algorithm()));
}

// ──────────────────────────────────────────────
// 2. Memoization
// ──────────────────────────────────────────────

#[test]
fn child_simulated_once_per_parent_run() {
    let provider = provider();
    let algo = SixtyForty::new(DateRange::unbounded());
    let runs = algo.runs.clone();
    let child = ChildAlgorithm::new(algo);

    // Referenced on every bar, and twice per bar through two handle clones.
    let mut parent = FundOfFunds {
        range: year_2020(),
        children: vec![(child.clone(), 0.3), (child, 0.3)],
    };
    let result = run_simulation(&mut parent, &provider).unwrap();
    assert!(result.is_complete());
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    run_simulation(&mut parent, &provider).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn separately_built_children_are_distinct_assets() {
    let provider = provider();
    let a = ChildAlgorithm::new(SixtyForty::new(DateRange::unbounded()));
    let b = ChildAlgorithm::new(SixtyForty::new(DateRange::unbounded()));
    assert_eq!(a.name(), b.name());
    assert_ne!(a.asset_id(), b.asset_id());

    let mut parent = FundOfFunds {
        range: year_2020(),
        children: vec![(a, 0.5), (b, 0.5)],
    };
    let result = run_simulation(&mut parent, &provider).unwrap();
    assert_eq!(result.final_positions.len(), 2);
}

// ──────────────────────────────────────────────
// 3. Range inheritance
// ──────────────────────────────────────────────

#[test]
fn child_with_own_range_keeps_it() {
    let provider = provider();
    let child_range = DateRange {
        start: Some(date(2020, 7, 1)),
        end: None,
    };
    let child = ChildAlgorithm::new(SixtyForty::new(child_range));

    let run = child.simulate(&provider, &year_2020()).unwrap();
    assert_eq!(run.start, date(2020, 7, 1));
    assert_eq!(run.end, date(2020, 12, 31));
    assert_eq!(run.nav_bars.first().map(|b| b.date), Some(date(2020, 7, 1)));
}

#[test]
fn parent_trading_before_child_starts_hits_missing_bar() {
    let provider = provider();
    let child = ChildAlgorithm::new(SixtyForty::new(DateRange {
        start: Some(date(2020, 7, 1)),
        end: None,
    }));
    let mut parent = FundOfFunds {
        range: year_2020(),
        children: vec![(child.clone(), 1.0)],
    };
    let result = run_simulation(&mut parent, &provider).unwrap();

    // The child has no NAV bar on the parent's first date.
    assert_eq!(
        result.halt,
        Some(SimError::DataGap {
            asset: child.asset_id(),
            date: date(2020, 1, 2),
        })
    );
}

#[test]
fn run_simulation_in_inherits_missing_end() {
    let provider = provider();
    let mut algo = SixtyForty::new(DateRange {
        start: Some(date(2020, 3, 2)),
        end: None,
    });
    let result = run_simulation_in(&mut algo, &provider, &year_2020()).unwrap();
    assert_eq!(result.start, date(2020, 3, 2));
    assert_eq!(result.end, date(2020, 12, 31));
}

// ──────────────────────────────────────────────
// 4. Cycles and failures
// ──────────────────────────────────────────────

/// Resolves the child handle stored in `me`, which wraps this very algorithm.
struct SelfReferencing {
    me: Arc<Mutex<Option<ChildAlgorithm>>>,
}

impl Algorithm for SelfReferencing {
    fn name(&self) -> &str {
        "ouroboros"
    }

    fn config(&self) -> SimConfig {
        SimConfig::with_range(DateRange::unbounded())
    }

    fn on_bar(&mut self, ctx: &mut BarContext<'_, '_>) -> Result<(), SimError> {
        let me = self
            .me
            .lock()
            .map_err(|_| SimError::Strategy("slot poisoned".into()))?
            .clone();
        if let Some(me) = me {
            ctx.asset(&me)?;
        }
        Ok(())
    }
}

#[test]
fn self_reference_is_reported_as_cycle() {
    let provider = provider();
    let slot = Arc::new(Mutex::new(None));
    let child = ChildAlgorithm::new(SelfReferencing { me: slot.clone() });
    *slot.lock().unwrap() = Some(child.clone());

    let mut parent = FundOfFunds {
        range: year_2020(),
        children: vec![(child, 0.5)],
    };
    let result = run_simulation(&mut parent, &provider).unwrap();

    assert!(result.trade_log.is_empty());
    match result.halt {
        Some(SimError::Composition(CompositionError::ChildFailed { name, error })) => {
            assert_eq!(name, "ouroboros");
            assert!(matches!(
                *error,
                SimError::Composition(CompositionError::Cycle { .. })
            ));
        }
        other => panic!("expected child failure, got {other:?}"),
    }
}

#[test]
fn child_configuration_error_surfaces_in_parent() {
    let provider = provider();
    let child = ChildAlgorithm::new(SixtyForty::new(DateRange::unbounded()));
    // Called without any range to inherit.
    let err = child.simulate(&provider, &DateRange::unbounded()).unwrap_err();
    assert!(matches!(
        err,
        CompositionError::ChildFailed { ref error, .. } if matches!(**error, SimError::Configuration(_))
    ));
}

// ──────────────────────────────────────────────
// 5. Sharing across threads
// ──────────────────────────────────────────────

#[test]
fn shared_child_waits_across_threads() {
    let provider = provider();
    let algo = SixtyForty::new(DateRange::unbounded());
    let runs = algo.runs.clone();
    let child = ChildAlgorithm::new(algo);

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let child = child.clone();
                let provider = &provider;
                scope.spawn(move || {
                    let mut parent = FundOfFunds {
                        range: year_2020(),
                        children: vec![(child, 1.0)],
                    };
                    run_simulation(&mut parent, provider).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Neither thread saw the other's active run as a cycle.
    assert!(results.iter().all(|r| r.is_complete()));
    assert_eq!(results[0].nav_bars, results[1].nav_bars);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}
