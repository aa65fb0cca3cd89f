use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CoreError, CoreResult};

/// An atomic debit-one/credit-another money movement. Immutable once posted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    pub description: String,
    /// Positive minor units; the direction lives in the account pairing.
    pub amount: i64,
    pub category: String,
    pub date: NaiveDate,
    pub debit_account: Uuid,
    pub credit_account: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<IdempotencyKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Unique token ensuring a logical posting applies at most once.
///
/// Constructed values only, so key shape is an invariant instead of an ad hoc
/// string convention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Key for a scheduled recurring execution on a given day.
    pub fn recurring(definition_id: Uuid, date: NaiveDate) -> Self {
        Self(format!("recurring:{}:{}", definition_id, date.format("%Y-%m-%d")))
    }

    /// Key for an automated fee charge due on a given day.
    pub fn fee(account_id: Uuid, date: NaiveDate) -> Self {
        Self(format!("fee:{}:{}", account_id, date.format("%Y-%m-%d")))
    }

    /// Key for the n-th payment of an installment plan.
    pub fn installment(plan_id: Uuid, index: u32) -> Self {
        Self(format!("installment:{}:{}", plan_id, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Input for posting a new transaction; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub description: String,
    pub amount: i64,
    pub category: String,
    pub date: NaiveDate,
    pub debit_account: Uuid,
    pub credit_account: Uuid,
    pub idempotency_key: Option<IdempotencyKey>,
    pub recurring_id: Option<Uuid>,
    pub installment_id: Option<Uuid>,
}

impl TransactionDraft {
    pub fn new(
        description: impl Into<String>,
        amount: i64,
        category: impl Into<String>,
        date: NaiveDate,
        debit_account: Uuid,
        credit_account: Uuid,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            category: category.into(),
            date,
            debit_account,
            credit_account,
            idempotency_key: None,
            recurring_id: None,
            installment_id: None,
        }
    }

    pub fn with_key(mut self, key: IdempotencyKey) -> Self {
        self.idempotency_key = Some(key);
        self
    }

    pub fn with_recurring(mut self, definition_id: Uuid) -> Self {
        self.recurring_id = Some(definition_id);
        self
    }

    pub fn with_installment(mut self, plan_id: Uuid) -> Self {
        self.installment_id = Some(plan_id);
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.amount <= 0 {
            return Err(CoreError::Validation(
                "transaction amount must be positive".into(),
            ));
        }
        if self.debit_account == self.credit_account {
            return Err(CoreError::Validation(
                "debit and credit accounts must differ".into(),
            ));
        }
        Ok(())
    }

    /// Materializes the draft into a transaction record.
    pub fn into_transaction(self) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            description: self.description,
            amount: self.amount,
            category: self.category,
            date: self.date,
            debit_account: self.debit_account,
            credit_account: self.credit_account,
            idempotency_key: self.idempotency_key,
            recurring_id: self.recurring_id,
            installment_id: self.installment_id,
            created_at: Utc::now(),
        }
    }
}
