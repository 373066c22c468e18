//! Strategy trait.

use crate::calendar::TradingCalendar;
use crate::engine::{BarContext, SimConfig, SimError};

/// User strategy logic, invoked once per trading date.
///
/// An instance may be simulated more than once (e.g. as a child asset of
/// several parent runs). Any per-run state must be reset in `on_start`.
pub trait Algorithm: Send {
    fn name(&self) -> &str;

    /// Range, warm-up, friction, gap policy and session calendar of this
    /// algorithm. Unset range bounds are inherited from an enclosing run.
    fn config(&self) -> SimConfig;

    /// Called once with the built calendar before the first bar.
    fn on_start(&mut self, _calendar: &TradingCalendar) -> Result<(), SimError> {
        Ok(())
    }

    /// Called on every calendar date, warm-up dates included. Orders
    /// submitted during warm-up are discarded.
    fn on_bar(&mut self, ctx: &mut BarContext<'_, '_>) -> Result<(), SimError>;
}
