//! Calendar month value type used for bucketing date ranges.
//!
//! Months are plain `(year, month)` pairs with no timezone attached, so
//! bucketing never depends on the local offset of the machine doing it.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid year-month: {0}")]
pub struct ParseYearMonthError(String);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(1..=12).contains(&month) {
            return None;
        }
        // Reject years chrono cannot represent.
        NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("validated on construction")
    }

    pub fn last_day(&self) -> NaiveDate {
        (28..=31)
            .rev()
            .find_map(|day| NaiveDate::from_ymd_opt(self.year, self.month, day))
            .expect("every month has a 28th")
    }

    /// The following month, or `None` past the last representable month.
    pub fn next(&self) -> Option<Self> {
        if self.month == 12 {
            Self::new(self.year.checked_add(1)?, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    /// The preceding month, or `None` before the first representable month.
    pub fn prev(&self) -> Option<Self> {
        if self.month == 1 {
            Self::new(self.year.checked_sub(1)?, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    /// Every month touched by the inclusive range `[start, end]`, in order.
    /// An inverted range yields nothing.
    pub fn months_in_range(start: NaiveDate, end: NaiveDate) -> Vec<Self> {
        if end < start {
            return Vec::new();
        }
        let last = Self::of(end);
        let mut current = Self::of(start);
        let mut months = Vec::new();
        while current <= last {
            months.push(current);
            match current.next() {
                Some(next) => current = next,
                None => break,
            }
        }
        months
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ParseYearMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| ParseYearMonthError(s.to_string()))?;
        if month.len() != 2 {
            return Err(ParseYearMonthError(s.to_string()));
        }
        let year: i32 = year.parse().map_err(|_| ParseYearMonthError(s.to_string()))?;
        let month: u32 = month.parse().map_err(|_| ParseYearMonthError(s.to_string()))?;
        Self::new(year, month).ok_or_else(|| ParseYearMonthError(s.to_string()))
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    #[test]
    fn test_rejects_invalid_month() {
        assert!(YearMonth::new(2025, 0).is_none());
        assert!(YearMonth::new(2025, 13).is_none());
    }

    #[test]
    fn test_display_and_parse() {
        assert_eq!(ym(2025, 3).to_string(), "2025-03");
        assert_eq!("2025-11".parse::<YearMonth>().unwrap(), ym(2025, 11));
        assert!("2025-3".parse::<YearMonth>().is_err());
        assert!("2025/03".parse::<YearMonth>().is_err());
        assert!("2025-13".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_month_bounds_handle_leap_years() {
        assert_eq!(ym(2024, 2).last_day(), date(2024, 2, 29));
        assert_eq!(ym(2025, 2).last_day(), date(2025, 2, 28));
        assert_eq!(ym(2025, 12).last_day(), date(2025, 12, 31));
        assert_eq!(ym(2025, 4).first_day(), date(2025, 4, 1));
    }

    #[test]
    fn test_next_and_prev_wrap_years() {
        assert_eq!(ym(2025, 12).next(), Some(ym(2026, 1)));
        assert_eq!(ym(2026, 1).prev(), Some(ym(2025, 12)));
    }

    #[test]
    fn test_edges_of_representable_range() {
        let last = YearMonth::of(NaiveDate::MAX);
        assert_eq!(last.next(), None);
        assert_eq!(last.last_day(), NaiveDate::MAX);
        assert_eq!(
            YearMonth::months_in_range(NaiveDate::MAX, NaiveDate::MAX),
            vec![last]
        );

        let first = YearMonth::of(NaiveDate::MIN);
        assert_eq!(first.prev(), None);
        assert_eq!(first.first_day(), NaiveDate::MIN);
    }

    #[test]
    fn test_ordering_is_chronological() {
        assert!(ym(2025, 12) < ym(2026, 1));
        assert!(ym(2025, 2) < ym(2025, 10));
    }

    #[test]
    fn test_months_in_range_spans_boundaries() {
        // A month view typically starts in the previous month and ends in the next.
        let months = YearMonth::months_in_range(date(2025, 9, 28), date(2025, 11, 8));
        assert_eq!(months, vec![ym(2025, 9), ym(2025, 10), ym(2025, 11)]);

        let single = YearMonth::months_in_range(date(2025, 10, 5), date(2025, 10, 11));
        assert_eq!(single, vec![ym(2025, 10)]);

        assert!(YearMonth::months_in_range(date(2025, 10, 5), date(2025, 10, 1)).is_empty());
    }

    #[test]
    fn test_serde_uses_string_form() {
        let json = serde_json::to_string(&ym(2025, 7)).unwrap();
        assert_eq!(json, "\"2025-07\"");
        let parsed: YearMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ym(2025, 7));
    }
}
