//! Data provider trait and structured error types.

use crate::domain::Bar;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Pull-style source of daily bars.
///
/// `bar` returns `Ok(None)` when the symbol is known but has no bar on
/// `date`, and `Err(SymbolNotFound)` when the symbol cannot be resolved at all.
pub trait BarProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn bar(&self, symbol: &str, date: NaiveDate) -> Result<Option<Bar>, DataError>;

    /// Date of the last bar available for `symbol`, if known.
    fn last_date(&self, symbol: &str) -> Result<Option<NaiveDate>, DataError>;
}

/// Bars held in memory, keyed by symbol then date.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    series: BTreeMap<String, BTreeMap<NaiveDate, Bar>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the series for `symbol`.
    ///
    /// Rejects duplicate dates and bars failing the OHLC sanity check.
    pub fn insert(&mut self, symbol: &str, bars: Vec<Bar>) -> Result<(), DataError> {
        let mut by_date = BTreeMap::new();
        for bar in bars {
            if !bar.is_sane() {
                return Err(DataError::ValidationError(format!(
                    "{symbol}: bar on {} fails OHLC sanity check",
                    bar.date
                )));
            }
            let date = bar.date;
            if by_date.insert(date, bar).is_some() {
                return Err(DataError::ValidationError(format!(
                    "{symbol}: duplicate bar on {date}"
                )));
            }
        }
        self.series.insert(symbol.to_string(), by_date);
        Ok(())
    }

    /// Builder-style `insert`.
    pub fn with_series(mut self, symbol: &str, bars: Vec<Bar>) -> Result<Self, DataError> {
        self.insert(symbol, bars)?;
        Ok(self)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|s| s.as_str())
    }

    /// Drop the bar of `symbol` on `date`, leaving a gap. Returns the removed bar.
    pub fn remove_bar(&mut self, symbol: &str, date: NaiveDate) -> Option<Bar> {
        self.series.get_mut(symbol)?.remove(&date)
    }

    fn series(&self, symbol: &str) -> Result<&BTreeMap<NaiveDate, Bar>, DataError> {
        self.series.get(symbol).ok_or_else(|| DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })
    }
}

impl BarProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn bar(&self, symbol: &str, date: NaiveDate) -> Result<Option<Bar>, DataError> {
        Ok(self.series(symbol)?.get(&date).cloned())
    }

    fn last_date(&self, symbol: &str) -> Result<Option<NaiveDate>, DataError> {
        Ok(self.series(symbol)?.keys().next_back().copied())
    }
}
