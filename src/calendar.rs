//! Trading calendar
//!
//! An immutable, strictly increasing sequence of trading session dates with
//! nearest-session resolution and fixed-offset window slicing.

use crate::data::CalendarSource;
use crate::error::{AnalysisError, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashSet;
use tracing::info;

/// Ordered, deduplicated trading days
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingCalendar {
    days: Vec<NaiveDate>,
}

impl TradingCalendar {
    /// Build a calendar from arbitrary session dates; fails when empty
    pub fn new(mut days: Vec<NaiveDate>) -> Result<Self> {
        days.sort_unstable();
        days.dedup();

        if days.is_empty() {
            return Err(AnalysisError::CalendarFetch(
                "calendar source returned no trading days".to_string(),
            ));
        }

        Ok(Self { days })
    }

    /// Fetch the calendar for `[year_start, year_end]` from a source
    pub fn from_source(source: &dyn CalendarSource, year_start: i32, year_end: i32) -> Result<Self> {
        let calendar = Self::new(source.trading_days(year_start, year_end)?)?;
        info!(
            "Loaded {} trading days ({} to {})",
            calendar.len(),
            calendar.first(),
            calendar.last()
        );
        Ok(calendar)
    }

    /// Monday-to-Friday sessions between `start` and `end` inclusive,
    /// excluding `holidays`
    pub fn weekdays(start: NaiveDate, end: NaiveDate, holidays: &[NaiveDate]) -> Result<Self> {
        let holidays: HashSet<NaiveDate> = holidays.iter().copied().collect();
        let days = start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .filter(|d| !holidays.contains(d))
            .collect();
        Self::new(days)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn first(&self) -> NaiveDate {
        self.days[0]
    }

    pub fn last(&self) -> NaiveDate {
        self.days[self.days.len() - 1]
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.binary_search(&date).is_ok()
    }

    /// Index of the trading day closest to `date`.
    ///
    /// An exact session is returned unchanged. When two sessions are equally
    /// distant the earlier one wins.
    fn nearest_index(&self, date: NaiveDate) -> usize {
        match self.days.binary_search(&date) {
            Ok(idx) => idx,
            Err(0) => 0,
            Err(idx) if idx == self.days.len() => idx - 1,
            Err(idx) => {
                let before = (date - self.days[idx - 1]).num_days();
                let after = (self.days[idx] - date).num_days();
                if before <= after {
                    idx - 1
                } else {
                    idx
                }
            }
        }
    }

    /// Resolve a date to its nearest trading day
    pub fn nearest_trading_day(&self, date: NaiveDate) -> NaiveDate {
        self.days[self.nearest_index(date)]
    }

    /// Trading days at offsets `[period_start, period_end)` from the anchor
    /// session of `date`.
    ///
    /// Fails with `OutsideCalendar` when `date` is not within the calendar
    /// span and with `OutOfRange` when the slice runs past either end.
    pub fn window_around(
        &self,
        date: NaiveDate,
        period_start: i32,
        period_end: i32,
    ) -> Result<&[NaiveDate]> {
        if date < self.first() || date > self.last() {
            return Err(AnalysisError::OutsideCalendar {
                date,
                first: self.first(),
                last: self.last(),
            });
        }

        let anchor = self.nearest_index(date) as i64;
        let lo = anchor + period_start as i64;
        let hi = anchor + period_end as i64;

        if lo < 0 || hi > self.days.len() as i64 || lo > hi {
            return Err(AnalysisError::OutOfRange {
                anchor: self.days[anchor as usize],
                start: period_start,
                end: period_end,
            });
        }

        Ok(&self.days[lo as usize..hi as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn june_2021() -> TradingCalendar {
        TradingCalendar::weekdays(day(2021, 6, 1), day(2021, 6, 30), &[]).unwrap()
    }

    #[test]
    fn test_new_sorts_and_dedups() {
        let calendar =
            TradingCalendar::new(vec![day(2021, 6, 3), day(2021, 6, 1), day(2021, 6, 3)]).unwrap();
        assert_eq!(calendar.days(), &[day(2021, 6, 1), day(2021, 6, 3)]);
    }

    #[test]
    fn test_empty_calendar_fails() {
        assert!(matches!(
            TradingCalendar::new(vec![]),
            Err(AnalysisError::CalendarFetch(_))
        ));
    }

    #[test]
    fn test_weekdays_skip_weekends_and_holidays() {
        let calendar =
            TradingCalendar::weekdays(day(2021, 7, 1), day(2021, 7, 9), &[day(2021, 7, 5)]).unwrap();
        assert_eq!(
            calendar.days(),
            &[
                day(2021, 7, 1),
                day(2021, 7, 2),
                day(2021, 7, 6),
                day(2021, 7, 7),
                day(2021, 7, 8),
                day(2021, 7, 9),
            ]
        );
    }

    #[test]
    fn test_nearest_exact_day_unchanged() {
        let calendar = june_2021();
        assert_eq!(calendar.nearest_trading_day(day(2021, 6, 15)), day(2021, 6, 15));
    }

    #[test]
    fn test_nearest_weekend_resolution() {
        let calendar = june_2021();
        // Saturday is one day from Friday, two from Monday
        assert_eq!(calendar.nearest_trading_day(day(2021, 6, 12)), day(2021, 6, 11));
        // Sunday is one day from Monday
        assert_eq!(calendar.nearest_trading_day(day(2021, 6, 13)), day(2021, 6, 14));
    }

    #[test]
    fn test_nearest_tie_prefers_earlier_day() {
        let calendar = TradingCalendar::new(vec![day(2021, 6, 10), day(2021, 6, 14)]).unwrap();
        assert_eq!(calendar.nearest_trading_day(day(2021, 6, 12)), day(2021, 6, 10));
    }

    #[test]
    fn test_nearest_clamps_to_edges() {
        let calendar = june_2021();
        assert_eq!(calendar.nearest_trading_day(day(2021, 5, 1)), day(2021, 6, 1));
        assert_eq!(calendar.nearest_trading_day(day(2021, 8, 1)), day(2021, 6, 30));
    }

    #[test]
    fn test_window_around() {
        let calendar = june_2021();
        let window = calendar.window_around(day(2021, 6, 15), -2, 3).unwrap();
        assert_eq!(
            window,
            &[
                day(2021, 6, 11),
                day(2021, 6, 14),
                day(2021, 6, 15),
                day(2021, 6, 16),
                day(2021, 6, 17),
            ]
        );
    }

    #[test]
    fn test_window_out_of_range_is_not_truncated() {
        let calendar = june_2021();
        let result = calendar.window_around(day(2021, 6, 2), -5, 6);
        assert!(matches!(result, Err(AnalysisError::OutOfRange { .. })));

        let result = calendar.window_around(day(2021, 6, 29), -5, 6);
        assert!(matches!(result, Err(AnalysisError::OutOfRange { .. })));
    }

    #[test]
    fn test_window_outside_calendar() {
        let calendar = june_2021();
        let result = calendar.window_around(day(2022, 1, 10), -5, 6);
        assert!(matches!(result, Err(AnalysisError::OutsideCalendar { .. })));
    }
}
