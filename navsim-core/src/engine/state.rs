//! Run configuration and run result.

use super::error::SimError;
use super::friction::{CostModel, ExecutionPreset, FrictionModel, Frictionless};
use crate::calendar::{NyseCalendar, SessionCalendar};
use crate::domain::{AssetId, Bar, Diagnostic, OrderReceipt};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// What to do when a held or traded asset has no bar on a needed date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataGapPolicy {
    /// Halt the run with `SimError::DataGap`.
    #[default]
    Abort,
    /// Keep the last mark (zero return), drop orders needing the bar.
    CarryForward,
}

/// A possibly open-ended date range.
///
/// Unset bounds are filled from the enclosing run when an algorithm is
/// simulated as a child asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Fill each unset bound from `parent`. Bounds already set are kept.
    pub fn inherit(&self, parent: &DateRange) -> DateRange {
        DateRange {
            start: self.start.or(parent.start),
            end: self.end.or(parent.end),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Both bounds, or a configuration error naming what is missing.
    pub fn resolve(&self) -> Result<(NaiveDate, NaiveDate), SimError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start <= end => Ok((start, end)),
            (Some(start), Some(end)) => Err(SimError::Configuration(format!(
                "start {start} is after end {end}"
            ))),
            (None, _) => Err(SimError::Configuration("missing start date".into())),
            (_, None) => Err(SimError::Configuration("missing end date".into())),
        }
    }
}

/// Per-algorithm simulation settings.
#[derive(Clone)]
pub struct SimConfig {
    pub range: DateRange,
    /// Calendar-day lookback before `range.start` during which no orders execute.
    pub warmup: Duration,
    pub gap_policy: DataGapPolicy,
    pub friction: Arc<dyn FrictionModel>,
    pub session: Arc<dyn SessionCalendar>,
}

impl SimConfig {
    /// Frictionless NYSE run over `[start, end]`, no warm-up, aborting on gaps.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self::with_range(DateRange::new(start, end))
    }

    /// Same defaults, with a range that may be left open for a parent to fill.
    pub fn with_range(range: DateRange) -> Self {
        Self {
            range,
            warmup: Duration::zero(),
            gap_policy: DataGapPolicy::Abort,
            friction: Arc::new(Frictionless),
            session: Arc::new(NyseCalendar),
        }
    }

    /// Out-of-range day counts saturate; the run then fails to configure.
    pub fn warmup_days(mut self, days: i64) -> Self {
        self.warmup = Duration::try_days(days).unwrap_or(if days < 0 {
            Duration::zero()
        } else {
            Duration::MAX
        });
        self
    }

    pub fn gap_policy(mut self, policy: DataGapPolicy) -> Self {
        self.gap_policy = policy;
        self
    }

    pub fn friction(mut self, friction: Arc<dyn FrictionModel>) -> Self {
        self.friction = friction;
        self
    }

    /// Use one of the built-in basis-point cost presets.
    pub fn preset(self, preset: ExecutionPreset) -> Self {
        match preset {
            ExecutionPreset::Frictionless => self.friction(Arc::new(Frictionless)),
            other => self.friction(Arc::new(CostModel::from_preset(other))),
        }
    }

    pub fn session(mut self, session: Arc<dyn SessionCalendar>) -> Self {
        self.session = session;
        self
    }
}

impl fmt::Debug for SimConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimConfig")
            .field("range", &self.range)
            .field("warmup", &self.warmup)
            .field("gap_policy", &self.gap_policy)
            .field("friction", &self.friction)
            .field("session", &self.session.name())
            .finish()
    }
}

/// Result of a complete (or halted) simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// One NAV bar per simulated date, starting at the first simulation date.
    pub nav_bars: Vec<Bar>,
    pub trade_log: Vec<OrderReceipt>,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(with = "position_pairs")]
    pub final_positions: BTreeMap<AssetId, f64>,
    pub final_cash: f64,
    pub final_nav: f64,
    /// Dates on which the strategy was invoked, warm-up included.
    pub bars_processed: usize,
    pub warmup_bars: usize,
    /// Why the run stopped early, if it did.
    #[serde(skip)]
    pub halt: Option<SimError>,
}

impl RunResult {
    /// NAV closes in date order.
    pub fn nav_curve(&self) -> Vec<f64> {
        self.nav_bars.iter().map(|b| b.close).collect()
    }

    /// Close-to-close NAV returns; one shorter than `nav_bars`.
    pub fn returns(&self) -> Vec<f64> {
        self.nav_bars
            .windows(2)
            .map(|w| w[1].close / w[0].close - 1.0)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.halt.is_none()
    }
}

/// Positions as `[asset, weight]` pairs, since `AssetId` is not a string key.
mod position_pairs {
    use crate::domain::AssetId;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        positions: &BTreeMap<AssetId, f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(positions.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<AssetId, f64>, D::Error> {
        let pairs = Vec::<(AssetId, f64)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InstanceId;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn inherit_fills_only_missing_bounds() {
        let parent = DateRange::new(d(2020, 1, 1), d(2020, 12, 31));
        let child = DateRange {
            start: Some(d(2020, 6, 1)),
            end: None,
        };
        let merged = child.inherit(&parent);
        assert_eq!(merged.start, Some(d(2020, 6, 1)));
        assert_eq!(merged.end, Some(d(2020, 12, 31)));

        let explicit = DateRange::new(d(2019, 1, 1), d(2019, 6, 30));
        assert_eq!(explicit.inherit(&parent), explicit);
    }

    #[test]
    fn resolve_rejects_missing_and_inverted() {
        assert!(matches!(
            DateRange::unbounded().resolve(),
            Err(SimError::Configuration(_))
        ));
        assert!(matches!(
            DateRange::new(d(2020, 2, 1), d(2020, 1, 1)).resolve(),
            Err(SimError::Configuration(_))
        ));
        assert_eq!(
            DateRange::new(d(2020, 1, 1), d(2020, 2, 1)).resolve().unwrap(),
            (d(2020, 1, 1), d(2020, 2, 1))
        );
    }

    #[test]
    fn config_defaults() {
        let config = SimConfig::new(d(2020, 1, 1), d(2020, 12, 31));
        assert_eq!(config.warmup, Duration::zero());
        assert_eq!(config.gap_policy, DataGapPolicy::Abort);
        assert_eq!(config.friction.cost(1.0, 100.0), 0.0);
        assert_eq!(config.session.name(), "NYSE");
    }

    #[test]
    fn builder_overrides() {
        let config = SimConfig::new(d(2020, 1, 1), d(2020, 12, 31))
            .warmup_days(30)
            .gap_policy(DataGapPolicy::CarryForward)
            .preset(ExecutionPreset::Realistic);
        assert_eq!(config.warmup, Duration::days(30));
        assert_eq!(config.gap_policy, DataGapPolicy::CarryForward);
        assert!(config.friction.cost(1.0, 100.0) > 0.0);
    }

    #[test]
    fn gap_policy_serializes_snake_case() {
        let json = serde_json::to_string(&DataGapPolicy::CarryForward).unwrap();
        assert_eq!(json, "\"carry_forward\"");
    }

    #[test]
    fn huge_warmup_saturates() {
        let config = SimConfig::new(d(2020, 1, 1), d(2020, 12, 31)).warmup_days(i64::MAX);
        assert_eq!(config.warmup, Duration::MAX);
    }

    #[test]
    fn run_result_with_positions_round_trips_through_json() {
        let mut final_positions = BTreeMap::new();
        final_positions.insert(AssetId::symbol("SPY"), 0.6);
        final_positions.insert(
            AssetId::Algorithm {
                id: InstanceId(42),
                name: "sixty_forty".into(),
            },
            0.4,
        );
        let result = RunResult {
            name: "fund".into(),
            start: d(2020, 1, 2),
            end: d(2020, 1, 3),
            nav_bars: vec![Bar::flat(d(2020, 1, 2), 1000.0)],
            trade_log: vec![],
            diagnostics: vec![],
            final_positions,
            final_cash: 0.0,
            final_nav: 1000.0,
            bars_processed: 1,
            warmup_bars: 0,
            halt: Some(SimError::Strategy("stopped".into())),
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: RunResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.final_positions, result.final_positions);
        assert_eq!(back.nav_bars, result.nav_bars);
        assert_eq!(back.final_nav, 1000.0);
        // The halt reason is not part of the serialized record.
        assert!(back.halt.is_none());
    }

    #[test]
    fn returns_from_nav_bars() {
        let result = RunResult {
            name: "t".into(),
            start: d(2020, 1, 2),
            end: d(2020, 1, 3),
            nav_bars: vec![Bar::flat(d(2020, 1, 2), 1000.0), Bar::flat(d(2020, 1, 3), 1100.0)],
            trade_log: vec![],
            diagnostics: vec![],
            final_positions: BTreeMap::new(),
            final_cash: 1.0,
            final_nav: 1100.0,
            bars_processed: 2,
            warmup_bars: 0,
            halt: None,
        };
        assert_eq!(result.nav_curve(), vec![1000.0, 1100.0]);
        assert!((result.returns()[0] - 0.1).abs() < 1e-12);
        assert!(result.is_complete());
    }
}
