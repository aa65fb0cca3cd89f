//! Calendar rules for recurring due dates.
//!
//! A [`BillingPattern`] maps a calendar anchor to the next due date. The
//! resolver walks month-by-month and never skips or double-fires, even when
//! it is invoked late (e.g. the app was not opened for several months).

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, CoreResult};

/// Closed set of supported billing-date rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "pattern", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingPattern {
    /// A fixed day-of-month, clamped to the last day of short months.
    FixedDay { day: u32 },
    /// The n-th occurrence of a weekday in the month, e.g. the 3rd Friday.
    NthWeekday { weekday: Weekday, n: u8 },
    /// The last Mon-Fri day of the month.
    LastBusinessDay,
}

impl BillingPattern {
    pub fn validate(&self) -> CoreResult<()> {
        match self {
            BillingPattern::FixedDay { day } if !(1..=31).contains(day) => Err(
                CoreError::Validation(format!("day-of-month {} is out of range 1..=31", day)),
            ),
            BillingPattern::NthWeekday { n, .. } if !(1..=5).contains(n) => Err(
                CoreError::Validation(format!("weekday ordinal {} is out of range 1..=5", n)),
            ),
            _ => Ok(()),
        }
    }

    /// Resolves the pattern inside the month containing `month_start`.
    /// Returns `None` when the month has no matching date (e.g. no 5th Friday).
    fn resolve_in_month(&self, month_start: NaiveDate) -> Option<NaiveDate> {
        let year = month_start.year();
        let month = month_start.month();
        match *self {
            BillingPattern::FixedDay { day } => {
                let clamped = day.min(days_in_month(year, month));
                NaiveDate::from_ymd_opt(year, month, clamped)
            }
            BillingPattern::NthWeekday { weekday, n } => {
                let first = month_start.with_day(1).unwrap();
                let offset = (weekday.num_days_from_monday() + 7
                    - first.weekday().num_days_from_monday())
                    % 7;
                let day = 1 + offset + 7 * (n as u32 - 1);
                if day > days_in_month(year, month) {
                    None
                } else {
                    NaiveDate::from_ymd_opt(year, month, day)
                }
            }
            BillingPattern::LastBusinessDay => {
                let mut date =
                    NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)).unwrap();
                while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                    date -= Duration::days(1);
                }
                Some(date)
            }
        }
    }
}

/// Pure resolution of the next due date for a pattern.
///
/// Resolution starts from the month containing `max(last_run, anchor)` and
/// advances month-by-month until the resolved date is strictly after
/// `last_run` (or after `anchor` when no run has happened yet). This keeps
/// progression monotonic: a late invocation yields the earliest missed date
/// rather than jumping ahead.
pub fn next_due_date(
    pattern: &BillingPattern,
    anchor: NaiveDate,
    last_run: Option<NaiveDate>,
) -> CoreResult<NaiveDate> {
    pattern.validate()?;
    let floor = last_run.unwrap_or(anchor);
    let mut cursor = floor.max(anchor).with_day(1).unwrap();
    // 1200 months is far beyond any realistic gap between invocations.
    for _ in 0..1200 {
        if let Some(resolved) = pattern.resolve_in_month(cursor) {
            if resolved > floor {
                return Ok(resolved);
            }
        }
        cursor = shift_month(cursor, 1);
    }
    Err(CoreError::Validation(format!(
        "billing pattern {:?} never resolves after {}",
        pattern, floor
    )))
}

/// Number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 28).unwrap());
    (first_next - Duration::days(1)).day()
}

/// Shifts a date by whole months, clamping the day to the target month.
pub fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 + months;
    while month > 12 {
        month -= 12;
        year += 1;
    }
    while month < 1 {
        month += 12;
        year -= 1;
    }
    let day = date.day().min(days_in_month(year, month as u32));
    NaiveDate::from_ymd_opt(year, month as u32, day).unwrap()
}
