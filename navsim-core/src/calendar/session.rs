//! Session predicates: which calendar days the venue is open.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};

/// Trading-day predicate consumed by `TradingCalendar::build`.
pub trait SessionCalendar: Send + Sync {
    /// Human-readable name of this venue calendar.
    fn name(&self) -> &str;

    fn is_trading_day(&self, date: NaiveDate) -> bool;

    /// Local time of the session close.
    fn session_close(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN)
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday through Friday, no holidays.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekdayCalendar;

impl SessionCalendar for WeekdayCalendar {
    fn name(&self) -> &str {
        "weekdays"
    }

    fn is_trading_day(&self, date: NaiveDate) -> bool {
        !is_weekend(date)
    }
}

/// New York Stock Exchange full-day closures.
///
/// Covers the regular holiday schedule (with weekend observance) plus the
/// unscheduled closures since 1994. Early closes are regular sessions here.
#[derive(Debug, Clone, Copy, Default)]
pub struct NyseCalendar;

/// Unscheduled full-day closures (weather, national days of mourning, 9/11).
const SPECIAL_CLOSURES: &[(i32, u32, u32)] = &[
    (1994, 4, 27),
    (2001, 9, 11),
    (2001, 9, 12),
    (2001, 9, 13),
    (2001, 9, 14),
    (2004, 6, 11),
    (2007, 1, 2),
    (2012, 10, 29),
    (2012, 10, 30),
    (2018, 12, 5),
    (2025, 1, 9),
];

impl NyseCalendar {
    /// All full-day holidays falling on weekdays in `year`.
    pub fn holidays(year: i32) -> Vec<NaiveDate> {
        let mut days = Vec::with_capacity(12);

        // New Year's Day: a Saturday holiday is not observed on the prior Friday.
        if let Some(jan1) = NaiveDate::from_ymd_opt(year, 1, 1) {
            match jan1.weekday() {
                Weekday::Sat => {}
                Weekday::Sun => days.push(jan1 + Duration::days(1)),
                _ => days.push(jan1),
            }
        }
        if year >= 1998 {
            days.extend(NaiveDate::from_weekday_of_month_opt(year, 1, Weekday::Mon, 3));
        }
        days.extend(NaiveDate::from_weekday_of_month_opt(year, 2, Weekday::Mon, 3));
        days.extend(easter_sunday(year).map(|d| d - Duration::days(2)));
        days.extend(last_weekday_of_month(year, 5, Weekday::Mon));
        if year >= 2022 {
            days.extend(NaiveDate::from_ymd_opt(year, 6, 19).map(observed));
        }
        days.extend(NaiveDate::from_ymd_opt(year, 7, 4).map(observed));
        days.extend(NaiveDate::from_weekday_of_month_opt(year, 9, Weekday::Mon, 1));
        days.extend(NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Thu, 4));
        days.extend(NaiveDate::from_ymd_opt(year, 12, 25).map(observed));

        days.extend(
            SPECIAL_CLOSURES
                .iter()
                .filter(|(y, _, _)| *y == year)
                .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        );

        days.sort_unstable();
        days.dedup();
        days
    }
}

impl SessionCalendar for NyseCalendar {
    fn name(&self) -> &str {
        "NYSE"
    }

    fn is_trading_day(&self, date: NaiveDate) -> bool {
        !is_weekend(date) && !Self::holidays(date.year()).contains(&date)
    }
}

/// Saturday holidays are observed on Friday, Sunday holidays on Monday.
fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let mut date = first_of_next - Duration::days(1);
    while date.weekday() != weekday {
        date -= Duration::days(1);
    }
    Some(date)
}

/// Gregorian Easter Sunday (anonymous Gregorian algorithm).
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn easter_known_years() {
        assert_eq!(easter_sunday(2020), Some(date(2020, 4, 12)));
        assert_eq!(easter_sunday(2021), Some(date(2021, 4, 4)));
        assert_eq!(easter_sunday(2024), Some(date(2024, 3, 31)));
    }

    #[test]
    fn nyse_2020_holidays() {
        let expected = vec![
            date(2020, 1, 1),
            date(2020, 1, 20),
            date(2020, 2, 17),
            date(2020, 4, 10),
            date(2020, 5, 25),
            date(2020, 7, 3), // July 4th on a Saturday
            date(2020, 9, 7),
            date(2020, 11, 26),
            date(2020, 12, 25),
        ];
        assert_eq!(NyseCalendar::holidays(2020), expected);
    }

    #[test]
    fn saturday_new_year_not_observed() {
        // 2022-01-01 was a Saturday; 2021-12-31 was a regular session.
        assert!(NyseCalendar.is_trading_day(date(2021, 12, 31)));
        assert!(!NyseCalendar::holidays(2022).contains(&date(2021, 12, 31)));
    }

    #[test]
    fn sunday_holiday_observed_monday() {
        // 2022-06-19 Juneteenth was a Sunday.
        assert!(!NyseCalendar.is_trading_day(date(2022, 6, 20)));
        // Juneteenth did not close the exchange before 2022.
        assert!(NyseCalendar.is_trading_day(date(2021, 6, 18)));
    }

    #[test]
    fn special_closures() {
        assert!(!NyseCalendar.is_trading_day(date(2012, 10, 29)));
        assert!(!NyseCalendar.is_trading_day(date(2018, 12, 5)));
        assert!(NyseCalendar.is_trading_day(date(2018, 12, 6)));
    }

    #[test]
    fn weekday_calendar_only_skips_weekends() {
        assert!(WeekdayCalendar.is_trading_day(date(2020, 1, 1)));
        assert!(!WeekdayCalendar.is_trading_day(date(2020, 1, 4)));
        assert!(!WeekdayCalendar.is_trading_day(date(2020, 1, 5)));
    }

    #[test]
    fn default_session_close_is_four_pm() {
        assert_eq!(NyseCalendar.session_close(), NaiveTime::from_hms_opt(16, 0, 0).unwrap());
    }
}
