//! Credit-card billing period, classification, and payment math.
//!
//! Pure read-side consumer of the store; debt is a negative balance by
//! convention, so `full_payment = max(0, -current_balance)`.

use std::collections::HashSet;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use uuid::Uuid;

use crate::domain::{AccountKind, Transaction};
use crate::errors::{CoreError, CoreResult};
use crate::schedule::{days_in_month, shift_month};
use crate::store::LedgerStore;

/// Category labels treated as card fees rather than purchases.
static FEE_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "biaya admin",
        "admin fee",
        "bunga",
        "interest",
        "denda",
        "late fee",
        "materai",
        "iuran tahunan",
        "annual fee",
    ]
    .into_iter()
    .collect()
});

const LATE_FEE_BLOCK_DAYS: i64 = 30;

/// One billing period's worth of classified activity and payment figures.
#[derive(Debug, Clone)]
pub struct BillingStatement {
    pub account_id: Uuid,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub due_date: NaiveDate,
    pub purchases: Vec<Transaction>,
    pub installments: Vec<Transaction>,
    pub fees: Vec<Transaction>,
    pub full_payment: i64,
    pub minimum_payment: i64,
    pub late_fee: i64,
    pub days_past_due: i64,
}

pub struct BillingService;

impl BillingService {
    /// Computes the statement for the billing period ending on the most
    /// recent occurrence of the account's billing day on or before `today`.
    pub fn calculate(
        store: &dyn LedgerStore,
        account_id: Uuid,
        today: NaiveDate,
    ) -> CoreResult<BillingStatement> {
        let account = store
            .account(account_id)
            .ok_or_else(|| CoreError::NotFound(format!("account {} not found", account_id)))?;
        if account.kind != AccountKind::CreditCard {
            return Err(CoreError::Configuration(format!(
                "account `{}` is not a credit card",
                account.name
            )));
        }
        let card = account.card.as_ref().ok_or_else(|| {
            CoreError::Configuration(format!(
                "account `{}` has no billing configuration; set billing day and due day first",
                account.name
            ))
        })?;
        card.validate()?;

        let period_end = occurrence_on_or_before(card.billing_day, today);
        let period_start = shift_month(period_end, -1).succ_opt().unwrap_or(period_end);
        let due_date = occurrence_after(card.due_day, period_end);

        let mut purchases = Vec::new();
        let mut installments = Vec::new();
        let mut fees = Vec::new();
        for txn in store.transactions_in_range(period_start, period_end) {
            if txn.credit_account != account_id {
                continue;
            }
            if txn.installment_id.is_some() {
                installments.push(txn);
            } else if is_fee_category(&txn.category) {
                fees.push(txn);
            } else {
                purchases.push(txn);
            }
        }

        let full_payment = (-account.current_balance).max(0);
        let percentage = full_payment * card.min_payment_bps as i64 / 10_000;
        let minimum_payment = percentage.max(card.min_payment_floor);

        let days_past_due = (today - due_date).num_days().max(0);
        let late_fee = if days_past_due > 0 {
            let blocks = (days_past_due + LATE_FEE_BLOCK_DAYS - 1) / LATE_FEE_BLOCK_DAYS;
            let base = if card.sharia {
                card.late_fee_fixed
            } else {
                full_payment * card.late_fee_bps as i64 / 10_000
            };
            base * blocks
        } else {
            0
        };

        Ok(BillingStatement {
            account_id,
            period_start,
            period_end,
            due_date,
            purchases,
            installments,
            fees,
            full_payment,
            minimum_payment,
            late_fee,
            days_past_due,
        })
    }
}

fn is_fee_category(category: &str) -> bool {
    FEE_KEYWORDS.contains(category.trim().to_lowercase().as_str())
}

/// Most recent occurrence of `day` (clamped) on or before `reference`.
fn occurrence_on_or_before(day: u32, reference: NaiveDate) -> NaiveDate {
    let candidate = clamp_to_month(day, reference);
    if candidate <= reference {
        candidate
    } else {
        clamp_to_month(day, shift_month(reference, -1))
    }
}

/// First occurrence of `day` (clamped) strictly after `reference`.
fn occurrence_after(day: u32, reference: NaiveDate) -> NaiveDate {
    let candidate = clamp_to_month(day, reference);
    if candidate > reference {
        candidate
    } else {
        clamp_to_month(day, shift_month(reference, 1))
    }
}

fn clamp_to_month(day: u32, month_of: NaiveDate) -> NaiveDate {
    use chrono::Datelike;
    let year = month_of.year();
    let month = month_of.month();
    NaiveDate::from_ymd_opt(year, month, day.min(days_in_month(year, month))).unwrap()
}
