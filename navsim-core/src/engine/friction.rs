//! Friction models: transaction cost charged against NAV at execution.
//!
//! A friction model maps an order (size as a fraction of NAV, fill price) to
//! the cost of that order, also as a fraction of NAV. The account converts it
//! to currency with the NAV at execution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pluggable cost function, one per run.
pub trait FrictionModel: Send + Sync + fmt::Debug {
    /// Cost of trading `order_size` (fraction of NAV, signed) at `fill_price`,
    /// as a non-negative fraction of NAV.
    fn cost(&self, order_size: f64, fill_price: f64) -> f64;
}

/// No cost at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frictionless;

impl FrictionModel for Frictionless {
    fn cost(&self, _order_size: f64, _fill_price: f64) -> f64 {
        0.0
    }
}

/// Basis-point cost model: slippage plus commission, both proportional to
/// the traded fraction of NAV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Slippage in basis points.
    pub slippage_bps: f64,
    /// Commission in basis points per side.
    pub commission_bps: f64,
}

impl CostModel {
    pub fn new(slippage_bps: f64, commission_bps: f64) -> Self {
        Self {
            slippage_bps,
            commission_bps,
        }
    }

    pub fn from_preset(preset: ExecutionPreset) -> Self {
        Self {
            slippage_bps: preset.slippage_bps(),
            commission_bps: preset.commission_bps(),
        }
    }

    pub fn total_bps(&self) -> f64 {
        self.slippage_bps + self.commission_bps
    }
}

impl FrictionModel for CostModel {
    fn cost(&self, order_size: f64, _fill_price: f64) -> f64 {
        order_size.abs() * self.total_bps() / 10_000.0
    }
}

/// Named cost presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPreset {
    Frictionless,
    Realistic,
    Hostile,
}

impl ExecutionPreset {
    pub fn slippage_bps(self) -> f64 {
        match self {
            Self::Frictionless => 0.0,
            Self::Realistic => 5.0,
            Self::Hostile => 20.0,
        }
    }

    pub fn commission_bps(self) -> f64 {
        match self {
            Self::Frictionless => 0.0,
            Self::Realistic => 5.0,
            Self::Hostile => 10.0,
        }
    }
}
