use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CoreError, CoreResult};
use crate::schedule::days_in_month;

/// Whether a recurring movement brings money into or out of the target account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    /// Prefix used when deriving category account names.
    pub fn label(&self) -> &'static str {
        match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
        }
    }
}

/// How often a definition fires, with its day selector folded into the variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "frequency", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Daily,
    Weekly { weekday: Weekday },
    /// Fires on the given day, clamped to the last day of short months.
    Monthly { day: u32 },
    /// Fires on the month and day of the definition's start date.
    Yearly,
}

/// A user-authored rule that synthesizes one transaction per due day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurringDefinition {
    pub id: Uuid,
    pub name: String,
    pub amount: i64,
    pub category: String,
    pub direction: Direction,
    pub account_id: Uuid,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_executed_at: Option<NaiveDate>,
    /// First-of-month markers for months the user chose to sit out. Kept
    /// separate from `last_executed_at` so "skipped" and "ran" never conflate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_months: Vec<NaiveDate>,
}

impl RecurringDefinition {
    pub fn new(
        name: impl Into<String>,
        amount: i64,
        category: impl Into<String>,
        direction: Direction,
        account_id: Uuid,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            amount,
            category: category.into(),
            direction,
            account_id,
            frequency,
            start_date,
            end_date: None,
            active: true,
            last_executed_at: None,
            skipped_months: Vec::new(),
        }
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation(
                "recurring definition name must not be empty".into(),
            ));
        }
        if self.amount <= 0 {
            return Err(CoreError::Validation(
                "recurring amount must be positive".into(),
            ));
        }
        if let Frequency::Monthly { day } = self.frequency {
            if !(1..=31).contains(&day) {
                return Err(CoreError::Validation(format!(
                    "day-of-month {} is out of range 1..=31",
                    day
                )));
            }
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(CoreError::Validation(
                    "end date must not precede the start date".into(),
                ));
            }
        }
        Ok(())
    }

    /// True when the definition should fire on `reference`.
    pub fn is_due_on(&self, reference: NaiveDate) -> bool {
        if reference < self.start_date {
            return false;
        }
        match self.frequency {
            Frequency::Daily => true,
            Frequency::Weekly { weekday } => reference.weekday() == weekday,
            Frequency::Monthly { day } => {
                let clamped = day.min(days_in_month(reference.year(), reference.month()));
                reference.day() == clamped
            }
            Frequency::Yearly => {
                let day = self
                    .start_date
                    .day()
                    .min(days_in_month(reference.year(), self.start_date.month()));
                reference.month() == self.start_date.month() && reference.day() == day
            }
        }
    }

    /// True when `reference`'s month was explicitly skipped.
    pub fn is_month_skipped(&self, reference: NaiveDate) -> bool {
        self.skipped_months
            .contains(&reference.with_day(1).unwrap())
    }

    /// Marks `reference`'s month as skipped.
    pub fn skip_month(&mut self, reference: NaiveDate) {
        let marker = reference.with_day(1).unwrap();
        if !self.skipped_months.contains(&marker) {
            self.skipped_months.push(marker);
        }
    }

    /// True when the end date (if any) has passed.
    pub fn is_expired(&self, reference: NaiveDate) -> bool {
        self.end_date.map_or(false, |end| end < reference)
    }
}
