//! Per-run asset resolution: provider symbols plus memoized child series.

use super::child::ChildAlgorithm;
use crate::data::{BarProvider, DataError};
use crate::domain::{AssetId, Bar, InstanceId};
use crate::engine::{DateRange, MarketData, RunResult, SimError};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::info;

/// A child algorithm's NAV curve, republished as daily bars.
#[derive(Debug, Clone)]
pub struct ChildSeries {
    name: String,
    bars: Vec<Bar>,
    index: HashMap<NaiveDate, usize>,
}

impl ChildSeries {
    /// Keep only the NAV curve; the child's trade log and diagnostics stay private.
    pub fn from_run(result: RunResult) -> Self {
        let index = result
            .nav_bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Self {
            name: result.name,
            bars: result.nav_bars,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bar(&self, date: NaiveDate) -> Option<&Bar> {
        self.index.get(&date).map(|&i| &self.bars[i])
    }

    /// Close-to-close return ending on `date`; `None` on the first bar.
    pub fn return_on(&self, date: NaiveDate) -> Option<f64> {
        let i = *self.index.get(&date)?;
        let prev = self.bars.get(i.checked_sub(1)?)?;
        Some(self.bars[i].close / prev.close - 1.0)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Market data for one run: symbols come from the provider, child algorithms
/// from series simulated on first reference and kept for the rest of the run.
pub struct AssetResolver<'p> {
    provider: &'p dyn BarProvider,
    /// Range children inherit their unset bounds from.
    range: DateRange,
    children: HashMap<InstanceId, ChildSeries>,
}

impl<'p> AssetResolver<'p> {
    pub fn new(provider: &'p dyn BarProvider, range: DateRange) -> Self {
        Self {
            provider,
            range,
            children: HashMap::new(),
        }
    }

    pub fn provider(&self) -> &'p dyn BarProvider {
        self.provider
    }

    /// Make `child` tradable in this run, simulating it if not done yet.
    pub fn resolve_child(&mut self, child: &ChildAlgorithm) -> Result<AssetId, SimError> {
        if !self.children.contains_key(&child.id()) {
            let result = child.simulate(self.provider, &self.range)?;
            info!(
                child = %child.name(),
                id = %child.id(),
                bars = result.nav_bars.len(),
                final_nav = result.final_nav,
                "child algorithm simulated"
            );
            self.children.insert(child.id(), ChildSeries::from_run(result));
        }
        Ok(child.asset_id())
    }

    /// Memoized series of a child already resolved in this run.
    pub fn child_series(&self, id: InstanceId) -> Option<&ChildSeries> {
        self.children.get(&id)
    }

    /// Number of distinct children simulated so far.
    pub fn simulated_children(&self) -> usize {
        self.children.len()
    }

    fn series(&self, asset: &AssetId) -> Result<&ChildSeries, SimError> {
        match asset {
            AssetId::Algorithm { id, .. } => {
                self.children.get(id).ok_or_else(|| SimError::UnknownAsset {
                    asset: asset.clone(),
                })
            }
            AssetId::Symbol(_) => Err(SimError::UnknownAsset {
                asset: asset.clone(),
            }),
        }
    }
}

fn provider_error(asset: &AssetId, err: DataError) -> SimError {
    match err {
        DataError::SymbolNotFound { .. } => SimError::UnknownAsset {
            asset: asset.clone(),
        },
        other => SimError::Data(other),
    }
}

impl MarketData for AssetResolver<'_> {
    fn bar(&mut self, asset: &AssetId, date: NaiveDate) -> Result<Option<Bar>, SimError> {
        match asset {
            AssetId::Symbol(symbol) => self
                .provider
                .bar(symbol, date)
                .map_err(|e| provider_error(asset, e)),
            AssetId::Algorithm { .. } => Ok(self.series(asset)?.bar(date).cloned()),
        }
    }

    fn last_date(&mut self, asset: &AssetId) -> Result<Option<NaiveDate>, SimError> {
        match asset {
            AssetId::Symbol(symbol) => self
                .provider
                .last_date(symbol)
                .map_err(|e| provider_error(asset, e)),
            AssetId::Algorithm { .. } => Ok(self.series(asset)?.last_date()),
        }
    }
}
