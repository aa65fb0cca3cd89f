use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CoreError, CoreResult};
use crate::schedule::BillingPattern;

/// A named balance-holding or categorical bucket in the double-entry model.
///
/// `Expense` and `Income` accounts are category accounts created on demand;
/// they are not user-facing money pools.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub opening_balance: i64,
    pub current_balance: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<CardConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_automation: Option<FeeAutomation>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    Bank,
    EWallet,
    Cash,
    CreditCard,
    Expense,
    Income,
}

impl AccountKind {
    /// Category accounts hold classification buckets, not user money.
    pub fn is_category(&self) -> bool {
        matches!(self, AccountKind::Expense | AccountKind::Income)
    }
}

impl Account {
    /// Creates a new account whose current balance starts at the opening balance.
    pub fn new(name: impl Into<String>, kind: AccountKind, opening_balance: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            opening_balance,
            current_balance: opening_balance,
            credit_limit: None,
            card: None,
            fee_automation: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_card(mut self, card: CardConfig) -> Self {
        self.card = Some(card);
        self
    }

    pub fn with_fee_automation(mut self, fee: FeeAutomation) -> Self {
        self.fee_automation = Some(fee);
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation(
                "account name must not be empty".into(),
            ));
        }
        if let Some(limit) = self.credit_limit {
            if limit < 0 {
                return Err(CoreError::Validation(
                    "credit limit must not be negative".into(),
                ));
            }
        }
        if let Some(card) = &self.card {
            card.validate()?;
        }
        if let Some(fee) = &self.fee_automation {
            fee.validate()?;
        }
        Ok(())
    }
}

/// Credit-card billing anchors and payment knobs.
///
/// Amounts are minor units; percentages are basis points so the math stays in
/// integers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardConfig {
    pub billing_day: u32,
    pub due_day: u32,
    #[serde(default = "CardConfig::default_min_payment_bps")]
    pub min_payment_bps: u32,
    #[serde(default = "CardConfig::default_min_payment_floor")]
    pub min_payment_floor: i64,
    #[serde(default = "CardConfig::default_late_fee_bps")]
    pub late_fee_bps: u32,
    #[serde(default = "CardConfig::default_late_fee_fixed")]
    pub late_fee_fixed: i64,
    /// Sharia-compliant products charge a fixed late fee instead of a percentage.
    #[serde(default)]
    pub sharia: bool,
}

impl CardConfig {
    pub fn new(billing_day: u32, due_day: u32) -> Self {
        Self {
            billing_day,
            due_day,
            min_payment_bps: Self::default_min_payment_bps(),
            min_payment_floor: Self::default_min_payment_floor(),
            late_fee_bps: Self::default_late_fee_bps(),
            late_fee_fixed: Self::default_late_fee_fixed(),
            sharia: false,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        for (label, day) in [("billing day", self.billing_day), ("due day", self.due_day)] {
            if !(1..=31).contains(&day) {
                return Err(CoreError::Configuration(format!(
                    "{} {} is out of range 1..=31",
                    label, day
                )));
            }
        }
        Ok(())
    }

    fn default_min_payment_bps() -> u32 {
        500
    }

    fn default_min_payment_floor() -> i64 {
        5_000_000
    }

    fn default_late_fee_bps() -> u32 {
        100
    }

    fn default_late_fee_fixed() -> i64 {
        2_500_000
    }
}

/// Automated periodic fee charged against an account (e.g. monthly admin fee).
///
/// The billing anchor day lives inside the pattern itself, so a `FixedDay`
/// rule without a day is unrepresentable rather than merely rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeeAutomation {
    pub enabled: bool,
    pub amount_minor: i64,
    pub pattern: BillingPattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_charged_at: Option<NaiveDate>,
    /// Optional link to the recurring definition this fee was created from;
    /// deleting that definition clears the automation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_id: Option<Uuid>,
}

impl FeeAutomation {
    pub fn new(amount_minor: i64, pattern: BillingPattern) -> Self {
        Self {
            enabled: true,
            amount_minor,
            pattern,
            last_charged_at: None,
            recurring_id: None,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.enabled && self.amount_minor <= 0 {
            return Err(CoreError::Validation(
                "fee amount must be positive when the automation is enabled".into(),
            ));
        }
        self.pattern.validate()
    }
}
