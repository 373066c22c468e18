//! Trading calendar: the ordered set of sessions a simulation visits.
//!
//! `TradingCalendar::build` expands a `[start - warmup, end]` window into the
//! venue's trading days. The first date is the earliest trading day on/after
//! the window start, the last is the latest trading day on/before `end`. An
//! inverted range yields an empty calendar, not an error.

pub mod session;

pub use session::{NyseCalendar, SessionCalendar, WeekdayCalendar};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Ordered, duplicate-free trading dates, split into warm-up and simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingCalendar {
    dates: Vec<NaiveDate>,
    /// Index of the first date >= `start`.
    first_sim_index: usize,
    session_close: NaiveTime,
}

impl TradingCalendar {
    /// Build the calendar for `[start - warmup, end]`.
    ///
    /// Empty when `start > end` or when `start - warmup` is out of range.
    pub fn build(
        start: NaiveDate,
        end: NaiveDate,
        warmup: Duration,
        session: &dyn SessionCalendar,
    ) -> Self {
        let session_close = session.session_close();
        let from = match warmup_start(start, warmup) {
            Some(from) if start <= end => from,
            _ => {
                return Self {
                    dates: Vec::new(),
                    first_sim_index: 0,
                    session_close,
                }
            }
        };

        let dates: Vec<NaiveDate> = from
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| session.is_trading_day(*d))
            .collect();
        let first_sim_index = dates.partition_point(|d| *d < start);

        Self {
            dates,
            first_sim_index,
            session_close,
        }
    }

    /// All dates, warm-up included.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Dates on/after `start`, the ones on which orders execute.
    pub fn simulation_dates(&self) -> &[NaiveDate] {
        &self.dates[self.first_sim_index..]
    }

    pub fn warmup_dates(&self) -> &[NaiveDate] {
        &self.dates[..self.first_sim_index]
    }

    pub fn first_sim_index(&self) -> usize {
        self.first_sim_index
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Position of `date` in the calendar, if it is a trading day in range.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    pub fn is_warmup(&self, date: NaiveDate) -> bool {
        self.index_of(date)
            .is_some_and(|i| i < self.first_sim_index)
    }

    /// The trading date following `date`, if any.
    pub fn next_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        let i = self.dates.partition_point(|d| *d <= date);
        self.dates.get(i).copied()
    }

    /// Timestamp of the session close on `date`.
    pub fn session_close(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.session_close)
    }
}

/// First calendar day of the warm-up window; `None` if it falls outside the
/// representable date range. Negative warm-ups count as zero.
pub fn warmup_start(start: NaiveDate, warmup: Duration) -> Option<NaiveDate> {
    start.checked_sub_signed(warmup.max(Duration::zero()))
}
