//! Calendar-month arithmetic shared by the calculators

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month (e.g. 2025-01)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

impl YearMonth {
    /// Create a month, None if `month` is outside 1-12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First calendar day of the month
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Months since year 0, used for distance arithmetic
    fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    fn from_ordinal(ordinal: i64) -> Self {
        Self {
            year: ordinal.div_euclid(12) as i32,
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }

    /// Following month
    pub fn next(&self) -> Self {
        Self::from_ordinal(self.ordinal() + 1)
    }

    /// Shift by a signed number of months
    pub fn offset(&self, months: i64) -> Self {
        Self::from_ordinal(self.ordinal() + months)
    }

    /// Signed number of months from `self` to `other`
    pub fn months_until(&self, other: YearMonth) -> i64 {
        other.ordinal() - self.ordinal()
    }

    /// Every month from `from` to `to`, both inclusive (empty if `from > to`)
    pub fn range_inclusive(from: YearMonth, to: YearMonth) -> impl Iterator<Item = YearMonth> {
        (from.ordinal()..=to.ordinal()).map(YearMonth::from_ordinal)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    /// Parse `YYYY-MM`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got '{}'", s))?;
        let year: i32 = year.parse().map_err(|_| format!("invalid year in '{}'", s))?;
        let month: u32 = month.parse().map_err(|_| format!("invalid month in '{}'", s))?;
        YearMonth::new(year, month).ok_or_else(|| format!("month out of range in '{}'", s))
    }
}

/// Whole calendar months elapsed from `start` to `end`
///
/// Only fully elapsed months count: if `end.day < start.day` the last,
/// partial month is dropped. Negative when `end` precedes `start`.
pub fn whole_months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let mut months = (end.year() as i64 - start.year() as i64) * 12
        + (end.month() as i64 - start.month() as i64);
    if end.day() < start.day() {
        months -= 1;
    }
    months
}

/// Months from `start` to `end` including the trailing partial month
///
/// The partial month is the leftover days divided by the length of the
/// month they fall in. Zero when `end <= start`.
pub fn fractional_months_between(start: NaiveDate, end: NaiveDate) -> f64 {
    if end <= start {
        return 0.0;
    }
    let whole = whole_months_between(start, end).max(0);
    let anchor = start
        .checked_add_months(Months::new(whole as u32))
        .unwrap_or(end)
        .min(end);
    let leftover_days = (end - anchor).num_days() as f64;
    whole as f64 + leftover_days / days_in_month(anchor) as f64
}

/// Number of days in the month containing `date`
pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date);
    match first.checked_add_months(Months::new(1)) {
        Some(next) => (next - first).num_days() as u32,
        None => 31,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_year_month_parse_and_display() {
        let ym: YearMonth = "2025-01".parse().unwrap();
        assert_eq!(ym, YearMonth::new(2025, 1).unwrap());
        assert_eq!(ym.to_string(), "2025-01");
        assert!("2025-13".parse::<YearMonth>().is_err());
        assert!("202501".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_year_month_navigation() {
        let dec = YearMonth::new(2024, 12).unwrap();
        assert_eq!(dec.next(), YearMonth::new(2025, 1).unwrap());
        assert_eq!(dec.offset(-12), YearMonth::new(2023, 12).unwrap());
        assert_eq!(dec.months_until(YearMonth::new(2025, 12).unwrap()), 12);

        let months: Vec<_> = YearMonth::range_inclusive(
            YearMonth::new(2025, 1).unwrap(),
            YearMonth::new(2025, 12).unwrap(),
        )
        .collect();
        assert_eq!(months.len(), 12);

        let empty = YearMonth::range_inclusive(
            YearMonth::new(2025, 2).unwrap(),
            YearMonth::new(2025, 1).unwrap(),
        );
        assert_eq!(empty.count(), 0);
    }

    #[test]
    fn test_whole_months_drops_partial_month() {
        assert_eq!(whole_months_between(date(2020, 1, 1), date(2021, 1, 1)), 12);
        assert_eq!(whole_months_between(date(2020, 1, 15), date(2020, 3, 14)), 1);
        assert_eq!(whole_months_between(date(2020, 1, 15), date(2020, 3, 15)), 2);
        assert_eq!(whole_months_between(date(2021, 1, 1), date(2020, 1, 1)), -12);
    }

    #[test]
    fn test_fractional_months() {
        assert_abs_diff_eq!(fractional_months_between(date(1980, 1, 1), date(2020, 1, 1)), 480.0);
        assert_abs_diff_eq!(
            fractional_months_between(date(2021, 4, 1), date(2021, 4, 16)),
            0.5,
            epsilon = 1e-12
        );
        assert_eq!(fractional_months_between(date(2021, 4, 1), date(2021, 4, 1)), 0.0);
        assert_eq!(fractional_months_between(date(2021, 4, 2), date(2021, 4, 1)), 0.0);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(date(2024, 2, 10)), 29);
        assert_eq!(days_in_month(date(2023, 2, 10)), 28);
        assert_eq!(days_in_month(date(2023, 12, 31)), 31);
    }
}
