//! Calendar window arithmetic for budgets and analytics.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::{BudgetPeriod, DateWindow};

/// Reporting range used by analytics, always anchored on the current date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimePeriod {
    Week,
    Month,
    /// The current month plus the two before it.
    Quarter,
    Year,
}

impl TimePeriod {
    pub const ALL: [TimePeriod; 4] = [
        TimePeriod::Week,
        TimePeriod::Month,
        TimePeriod::Quarter,
        TimePeriod::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Week => "week",
            TimePeriod::Month => "month",
            TimePeriod::Quarter => "quarter",
            TimePeriod::Year => "year",
        }
    }

    pub fn window(&self, today: NaiveDate, week_start: Weekday) -> DateWindow {
        match self {
            TimePeriod::Week => week_window(today, week_start),
            TimePeriod::Month => month_window(today),
            TimePeriod::Quarter => DateWindow {
                start: months_before(month_start(today), 2),
                end: month_end(today),
            },
            TimePeriod::Year => year_window(today),
        }
    }
}

impl std::str::FromStr for TimePeriod {
    type Err = crate::errors::TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        TimePeriod::ALL
            .into_iter()
            .find(|period| period.as_str() == key)
            .ok_or_else(|| {
                crate::errors::TrackerError::validation(format!(
                    "unknown period `{s}` (expected week, month, quarter, year)"
                ))
            })
    }
}

impl std::fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar window of `period` that contains `today`.
pub fn calendar_window(period: BudgetPeriod, today: NaiveDate, week_start: Weekday) -> DateWindow {
    match period {
        BudgetPeriod::Daily => DateWindow {
            start: today,
            end: today,
        },
        BudgetPeriod::Weekly => week_window(today, week_start),
        BudgetPeriod::Monthly => month_window(today),
        BudgetPeriod::Yearly => year_window(today),
    }
}

pub fn week_window(date: NaiveDate, week_start: Weekday) -> DateWindow {
    let offset = (7 + date.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    let start = date - Duration::days(i64::from(offset));
    DateWindow {
        start,
        end: start + Duration::days(6),
    }
}

pub fn month_window(date: NaiveDate) -> DateWindow {
    DateWindow {
        start: month_start(date),
        end: month_end(date),
    }
}

pub fn year_window(date: NaiveDate) -> DateWindow {
    let start = date - Duration::days(i64::from(date.ordinal0()));
    let length = if is_leap_year(date.year()) { 366 } else { 365 };
    DateWindow {
        start,
        end: start + Duration::days(length - 1),
    }
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

pub fn month_end(date: NaiveDate) -> NaiveDate {
    month_start(date) + Duration::days(i64::from(days_in_month(date.year(), date.month())) - 1)
}

/// First day of the month `count` months before the one containing `date`.
pub fn months_before(date: NaiveDate, count: u32) -> NaiveDate {
    let mut start = month_start(date);
    for _ in 0..count {
        start = month_start(start - Duration::days(1));
    }
    start
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_respects_first_weekday() {
        // 2024-05-15 is a Wednesday.
        let sunday = week_window(date(2024, 5, 15), Weekday::Sun);
        assert_eq!(sunday.start, date(2024, 5, 12));
        assert_eq!(sunday.end, date(2024, 5, 18));

        let monday = week_window(date(2024, 5, 15), Weekday::Mon);
        assert_eq!(monday.start, date(2024, 5, 13));

        let on_start = week_window(date(2024, 5, 12), Weekday::Sun);
        assert_eq!(on_start.start, date(2024, 5, 12));
    }

    #[test]
    fn month_and_year_bounds() {
        let feb = month_window(date(2024, 2, 10));
        assert_eq!(feb.start, date(2024, 2, 1));
        assert_eq!(feb.end, date(2024, 2, 29));

        let year = year_window(date(2023, 7, 4));
        assert_eq!(year.start, date(2023, 1, 1));
        assert_eq!(year.end, date(2023, 12, 31));
    }

    #[test]
    fn quarter_spans_three_months_across_year_boundary() {
        let window = TimePeriod::Quarter.window(date(2024, 1, 20), Weekday::Sun);
        assert_eq!(window.start, date(2023, 11, 1));
        assert_eq!(window.end, date(2024, 1, 31));
    }

    #[test]
    fn parses_period_names() {
        assert_eq!("Month".parse::<TimePeriod>().unwrap(), TimePeriod::Month);
        assert!("decade".parse::<TimePeriod>().is_err());
    }
}
