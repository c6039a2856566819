//! Calendar months and the month-name conventions of upstream tables.
//!
//! Upstream collectors key their monthly rows by `(year, month name)`, and
//! they disagree on the spelling: some write `"March"`, others `"Mar"`. The
//! convention is a property of the metric family, so it is modelled as an
//! explicit [`MonthNameStyle`] rather than string branching at call sites.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

const FULL_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const ABBREVIATED_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Month-name spelling used as a join key by a metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthNameStyle {
    /// `"January"`, `"February"`, ...
    Full,
    /// `"Jan"`, `"Feb"`, ...
    Abbreviated,
}

impl MonthNameStyle {
    /// Name of `month` (1-12) in this style. Out-of-range months are clamped.
    pub fn name(self, month: u32) -> &'static str {
        let idx = (month.clamp(1, 12) - 1) as usize;
        match self {
            MonthNameStyle::Full => FULL_NAMES[idx],
            MonthNameStyle::Abbreviated => ABBREVIATED_NAMES[idx],
        }
    }

    /// Parse a month name in either style (case-insensitive) to 1-12.
    pub fn parse_any(name: &str) -> Option<u32> {
        let trimmed = name.trim();
        FULL_NAMES
            .iter()
            .zip(ABBREVIATED_NAMES.iter())
            .position(|(full, short)| {
                full.eq_ignore_ascii_case(trimmed) || short.eq_ignore_ascii_case(trimmed)
            })
            .map(|idx| idx as u32 + 1)
    }
}

impl fmt::Display for MonthNameStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthNameStyle::Full => write!(f, "full"),
            MonthNameStyle::Abbreviated => write!(f, "abbreviated"),
        }
    }
}

/// A `(year, month)` pair with month in 1-12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
}

impl CalendarMonth {
    /// Create a calendar month, returning `None` when `month` is not 1-12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The calendar month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month `n` months before this one, wrapping year boundaries.
    pub fn months_before(self, n: u32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) - n as i32;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// Month name in the given style.
    pub fn name(self, style: MonthNameStyle) -> &'static str {
        style.name(self.month)
    }

    /// Number of days in this month (the day number of month end).
    pub fn last_day(self) -> u32 {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.pred_opt())
            .map(|d| d.day())
            .unwrap_or(31)
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(MonthNameStyle::Full), self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_in_both_styles() {
        assert_eq!(MonthNameStyle::Full.name(3), "March");
        assert_eq!(MonthNameStyle::Abbreviated.name(3), "Mar");
        assert_eq!(MonthNameStyle::Abbreviated.name(9), "Sep");
    }

    #[test]
    fn parse_any_accepts_both_styles() {
        assert_eq!(MonthNameStyle::parse_any("September"), Some(9));
        assert_eq!(MonthNameStyle::parse_any("sep"), Some(9));
        assert_eq!(MonthNameStyle::parse_any(" May "), Some(5));
        assert_eq!(MonthNameStyle::parse_any("Sept"), None);
    }

    #[test]
    fn months_before_wraps_year() {
        let jan = CalendarMonth::new(2026, 1).unwrap();
        assert_eq!(jan.months_before(4), CalendarMonth::new(2025, 9).unwrap());
        assert_eq!(jan.months_before(13), CalendarMonth::new(2024, 12).unwrap());
        assert_eq!(jan.months_before(0), jan);
    }

    #[test]
    fn new_rejects_out_of_range() {
        assert!(CalendarMonth::new(2026, 0).is_none());
        assert!(CalendarMonth::new(2026, 13).is_none());
    }

    #[test]
    fn last_day_handles_leap_years() {
        assert_eq!(CalendarMonth::new(2024, 2).unwrap().last_day(), 29);
        assert_eq!(CalendarMonth::new(2026, 2).unwrap().last_day(), 28);
        assert_eq!(CalendarMonth::new(2026, 12).unwrap().last_day(), 31);
        assert_eq!(CalendarMonth::new(2026, 4).unwrap().last_day(), 30);
    }

    #[test]
    fn display_uses_full_name() {
        assert_eq!(CalendarMonth::new(2026, 10).unwrap().to_string(), "October 2026");
    }
}
