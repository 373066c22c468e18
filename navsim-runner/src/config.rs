//! Serializable run configuration.
//!
//! A `RunConfig` pins down everything about a run except the strategy logic:
//! date range, warm-up, gap policy, friction and session calendar. It loads
//! from TOML and hashes to a content-addressed `RunId`.

use chrono::NaiveDate;
use navsim_core::calendar::{NyseCalendar, SessionCalendar, TradingCalendar, WeekdayCalendar};
use navsim_core::engine::{
    BarContext, CostModel, DataGapPolicy, DateRange, ExecutionPreset, Frictionless, SimConfig,
    SimError,
};
use navsim_core::Algorithm;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

/// Longest accepted warm-up, in calendar days.
pub const MAX_WARMUP_DAYS: i64 = 36_500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize to TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("cannot serialize to JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Venue session calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarKind {
    #[default]
    Nyse,
    Weekdays,
}

impl CalendarKind {
    pub fn session(self) -> Arc<dyn SessionCalendar> {
        match self {
            Self::Nyse => Arc::new(NyseCalendar),
            Self::Weekdays => Arc::new(WeekdayCalendar),
        }
    }
}

/// Transaction cost configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrictionConfig {
    #[default]
    Frictionless,
    /// One of the named presets.
    Preset { preset: ExecutionPreset },
    /// Explicit basis points.
    Bps { slippage_bps: f64, commission_bps: f64 },
}

/// Serializable configuration for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub name: String,

    /// First simulated date (inclusive).
    pub start_date: NaiveDate,

    /// Last simulated date (inclusive).
    pub end_date: NaiveDate,

    /// Calendar days of history before `start_date` with no order execution.
    #[serde(default)]
    pub warmup_days: i64,

    #[serde(default)]
    pub gap_policy: DataGapPolicy,

    #[serde(default)]
    pub calendar: CalendarKind,

    #[serde(default)]
    pub friction: FrictionConfig,
}

impl RunConfig {
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            start_date,
            end_date,
            warmup_days: 0,
            gap_policy: DataGapPolicy::default(),
            calendar: CalendarKind::default(),
            friction: FrictionConfig::default(),
        }
    }

    /// Parse and validate.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("name is empty".into()));
        }
        if self.start_date > self.end_date {
            return Err(ConfigError::Invalid(format!(
                "start_date {} is after end_date {}",
                self.start_date, self.end_date
            )));
        }
        if !(0..=MAX_WARMUP_DAYS).contains(&self.warmup_days) {
            return Err(ConfigError::Invalid(format!(
                "warmup_days must be in 0..={MAX_WARMUP_DAYS}, got {}",
                self.warmup_days
            )));
        }
        if let FrictionConfig::Bps {
            slippage_bps,
            commission_bps,
        } = self.friction
        {
            for (field, bps) in [("slippage_bps", slippage_bps), ("commission_bps", commission_bps)] {
                if !bps.is_finite() || bps < 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "{field} must be finite and >= 0, got {bps}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Deterministic hash of the configuration.
    ///
    /// Two runs with identical configs share a `RunId`.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Engine settings for this run.
    pub fn sim_config(&self) -> SimConfig {
        let config = SimConfig::with_range(self.date_range())
            .warmup_days(self.warmup_days)
            .gap_policy(self.gap_policy)
            .session(self.calendar.session());
        match self.friction {
            FrictionConfig::Frictionless => config.friction(Arc::new(Frictionless)),
            FrictionConfig::Preset { preset } => config.preset(preset),
            FrictionConfig::Bps {
                slippage_bps,
                commission_bps,
            } => config.friction(Arc::new(CostModel::new(slippage_bps, commission_bps))),
        }
    }

    /// Wrap `algorithm` so it runs under this configuration instead of its own.
    pub fn apply(&self, algorithm: Box<dyn Algorithm>) -> Configured {
        Configured {
            inner: algorithm,
            config: self.sim_config(),
        }
    }
}

/// An algorithm whose `SimConfig` is replaced by one from a `RunConfig`.
pub struct Configured {
    inner: Box<dyn Algorithm>,
    config: SimConfig,
}

impl Algorithm for Configured {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn config(&self) -> SimConfig {
        self.config.clone()
    }

    fn on_start(&mut self, calendar: &TradingCalendar) -> Result<(), SimError> {
        self.inner.on_start(calendar)
    }

    fn on_bar(&mut self, ctx: &mut BarContext<'_, '_>) -> Result<(), SimError> {
        self.inner.on_bar(ctx)
    }
}
