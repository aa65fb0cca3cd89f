use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CoreError, CoreResult};

/// Fixed-tenor repayment plan (cicilan) against a credit liability account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallmentPlan {
    pub id: Uuid,
    pub product: String,
    pub principal: i64,
    /// Number of monthly payments.
    pub tenor: u32,
    /// 1-based index of the next payment; `tenor + 1` once settled.
    pub current_index: u32,
    pub monthly_amount: i64,
    #[serde(default)]
    pub admin_fee: i64,
    /// Interest in basis points.
    #[serde(default)]
    pub interest_bps: u32,
    pub due_day: u32,
    pub status: InstallmentStatus,
    /// Liability side, credited on every payment.
    pub credit_account: Uuid,
    /// Expense side, debited on every payment.
    pub debit_account: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Aktif,
    Lunas,
}

impl InstallmentPlan {
    pub fn new(
        product: impl Into<String>,
        principal: i64,
        tenor: u32,
        monthly_amount: i64,
        due_day: u32,
        credit_account: Uuid,
        debit_account: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product: product.into(),
            principal,
            tenor,
            current_index: 1,
            monthly_amount,
            admin_fee: 0,
            interest_bps: 0,
            due_day,
            status: InstallmentStatus::Aktif,
            credit_account,
            debit_account,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.product.trim().is_empty() {
            return Err(CoreError::Validation(
                "installment product name must not be empty".into(),
            ));
        }
        if self.tenor == 0 {
            return Err(CoreError::Validation("tenor must be at least 1".into()));
        }
        if self.principal <= 0 || self.monthly_amount <= 0 {
            return Err(CoreError::Validation(
                "installment amounts must be positive".into(),
            ));
        }
        if !(1..=31).contains(&self.due_day) {
            return Err(CoreError::Validation(format!(
                "due day {} is out of range 1..=31",
                self.due_day
            )));
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, InstallmentStatus::Aktif)
    }

    /// Payments still owed, including the one at `current_index`.
    pub fn remaining_months(&self) -> u32 {
        (self.tenor + 1).saturating_sub(self.current_index)
    }

    /// Advances the payment counter, flipping to `Lunas` past the tenor.
    pub fn advance(&mut self) {
        self.current_index += 1;
        if self.current_index > self.tenor {
            self.status = InstallmentStatus::Lunas;
        }
    }

    /// Closes the plan in one step, as an accelerated payoff does.
    pub fn settle(&mut self) {
        self.current_index = self.tenor + 1;
        self.status = InstallmentStatus::Lunas;
    }
}
