//! Calendar arithmetic shared by the generator, the bucketer, and reports.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Adds `months` calendar months to `date`, clamping the day to the end of the
/// target month (Jan 31 + 1 month = Feb 28/29). Returns `date` unchanged when
/// the result falls outside the representable calendar.
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let index = i64::from(date.year()) * 12 + i64::from(date.month0()) + i64::from(months);
    let Ok(year) = i32::try_from(index.div_euclid(12)) else {
        return date;
    };
    let month = index.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

/// Number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year.saturating_add(1), 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .map(|first_next| (first_next - Duration::days(1)).day())
        .unwrap_or(28)
}

/// A calendar month identified by year and 1-based month number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    /// Returns `None` when `month` is outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Zero-based month index, the form used inside instance identifiers.
    pub fn month0(&self) -> u32 {
        self.month - 1
    }

    /// Three-letter month label, e.g. `Jan`.
    pub fn short_label(&self) -> &'static str {
        const LABELS: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        LABELS[(self.month0() as usize).min(11)]
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Inclusive span of calendar months, used for gap-free trend axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: MonthKey,
    pub end: MonthKey,
}

impl MonthWindow {
    /// Builds the window covering every month touched by `[start, end]`.
    /// An inverted interval collapses to the start month.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        let first = MonthKey::of(start);
        let last = MonthKey::of(end).max(first);
        Self {
            start: first,
            end: last,
        }
    }

    /// January through December of `year`.
    pub fn year(year: i32) -> Self {
        Self {
            start: MonthKey { year, month: 1 },
            end: MonthKey { year, month: 12 },
        }
    }

    pub fn months(&self) -> Vec<MonthKey> {
        let mut months = Vec::new();
        let mut current = self.start;
        while current <= self.end {
            months.push(current);
            current = current.succ();
        }
        months
    }
}

/// Reporting period selector: a single month or a whole year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    Month(MonthKey),
    Year(i32),
}

impl Period {
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            Period::Month(key) => key.contains(date),
            Period::Year(year) => date.year() == *year,
        }
    }

    pub fn year(&self) -> i32 {
        match self {
            Period::Month(key) => key.year,
            Period::Year(year) => *year,
        }
    }

    /// Parses `YYYY` or `YYYY-MM`.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        match trimmed.split_once('-') {
            Some((year, month)) => {
                let year = year.parse().ok()?;
                let month = month.parse().ok()?;
                MonthKey::new(year, month).map(Period::Month)
            }
            None => trimmed.parse().ok().map(Period::Year),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Month(key) => key.fmt(f),
            Period::Year(year) => write!(f, "{year:04}"),
        }
    }
}
