//! Persisted-store abstraction consumed by every service.
//!
//! The core never updates a balance outside an atomic [`Batch`]; backends
//! must apply a batch all-or-nothing. Both shipped backends share the same
//! in-memory [`Dataset`] so their semantics cannot drift.

pub mod json_backend;
pub mod memory;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Account, IdempotencyKey, InstallmentPlan, NetWorthSnapshot, RecurringDefinition, Transaction,
};
use crate::errors::{CoreError, CoreResult};

pub use json_backend::JsonStore;
pub use memory::MemoryStore;

/// Abstraction over persistence backends holding the ledger dataset.
pub trait LedgerStore: Send + Sync {
    fn account(&self, id: Uuid) -> Option<Account>;
    fn account_by_name(&self, name: &str) -> Option<Account>;
    fn accounts(&self) -> Vec<Account>;
    fn transaction(&self, id: Uuid) -> Option<Transaction>;
    fn transactions(&self) -> Vec<Transaction>;
    /// Transactions with `start <= date <= end`.
    fn transactions_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<Transaction>;
    fn transaction_by_key(&self, key: &IdempotencyKey) -> Option<Transaction>;
    fn recurring(&self, id: Uuid) -> Option<RecurringDefinition>;
    fn recurring_definitions(&self) -> Vec<RecurringDefinition>;
    fn installment(&self, id: Uuid) -> Option<InstallmentPlan>;
    fn installments(&self) -> Vec<InstallmentPlan>;
    fn snapshot(&self, date: NaiveDate) -> Option<NetWorthSnapshot>;
    fn snapshots(&self) -> Vec<NetWorthSnapshot>;

    /// Applies a multi-record write group atomically. A rejected batch leaves
    /// the store untouched.
    fn apply(&mut self, batch: Batch) -> CoreResult<()>;
}

/// One record-level mutation inside a [`Batch`]. Puts are upserts.
#[derive(Debug, Clone)]
pub enum Change {
    PutAccount(Account),
    DeleteAccount(Uuid),
    PutTransaction(Transaction),
    DeleteTransaction(Uuid),
    PutRecurring(RecurringDefinition),
    DeleteRecurring(Uuid),
    PutInstallment(InstallmentPlan),
    DeleteInstallment(Uuid),
    PutSnapshot(NetWorthSnapshot),
}

/// Ordered group of changes applied as one atomic unit.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    changes: Vec<Change>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(change: Change) -> Self {
        let mut batch = Self::new();
        batch.push(change);
        batch
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }
}

/// The full persisted dataset. Backends wrap this and delegate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub recurring: Vec<RecurringDefinition>,
    #[serde(default)]
    pub installments: Vec<InstallmentPlan>,
    #[serde(default)]
    pub snapshots: Vec<NetWorthSnapshot>,
}

impl Dataset {
    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn account_by_name(&self, name: &str) -> Option<&Account> {
        let normalized = name.trim().to_lowercase();
        self.accounts
            .iter()
            .find(|account| account.name.trim().to_lowercase() == normalized)
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn transaction_by_key(&self, key: &IdempotencyKey) -> Option<&Transaction> {
        self.transactions
            .iter()
            .find(|txn| txn.idempotency_key.as_ref() == Some(key))
    }

    pub fn recurring(&self, id: Uuid) -> Option<&RecurringDefinition> {
        self.recurring.iter().find(|def| def.id == id)
    }

    pub fn installment(&self, id: Uuid) -> Option<&InstallmentPlan> {
        self.installments.iter().find(|plan| plan.id == id)
    }

    pub fn snapshot(&self, date: NaiveDate) -> Option<&NetWorthSnapshot> {
        self.snapshots.iter().find(|snap| snap.date == date)
    }

    /// Validates then applies every change; a validation failure leaves the
    /// dataset untouched.
    pub fn apply(&mut self, batch: Batch) -> CoreResult<()> {
        self.validate(&batch)?;
        for change in batch.changes {
            self.apply_change(change);
        }
        Ok(())
    }

    fn validate(&self, batch: &Batch) -> CoreResult<()> {
        let mut pending_keys: Vec<(&IdempotencyKey, Uuid)> = Vec::new();
        for change in batch.changes() {
            match change {
                Change::PutTransaction(txn) => {
                    if let Some(key) = &txn.idempotency_key {
                        let stored_clash = self.transactions.iter().any(|existing| {
                            existing.id != txn.id
                                && existing.idempotency_key.as_ref() == Some(key)
                        });
                        let batch_clash = pending_keys
                            .iter()
                            .any(|(pending, id)| *pending == key && *id != txn.id);
                        if stored_clash || batch_clash {
                            return Err(CoreError::Conflict(format!(
                                "idempotency key `{}` already used",
                                key.as_str()
                            )));
                        }
                        pending_keys.push((key, txn.id));
                    }
                }
                Change::DeleteAccount(id) if self.account(*id).is_none() => {
                    return Err(CoreError::NotFound(format!("account {} not found", id)));
                }
                Change::DeleteTransaction(id) if self.transaction(*id).is_none() => {
                    return Err(CoreError::NotFound(format!("transaction {} not found", id)));
                }
                Change::DeleteRecurring(id) if self.recurring(*id).is_none() => {
                    return Err(CoreError::NotFound(format!(
                        "recurring definition {} not found",
                        id
                    )));
                }
                Change::DeleteInstallment(id) if self.installment(*id).is_none() => {
                    return Err(CoreError::NotFound(format!(
                        "installment plan {} not found",
                        id
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn apply_change(&mut self, change: Change) {
        match change {
            Change::PutAccount(account) => upsert(&mut self.accounts, account, |a| a.id),
            Change::DeleteAccount(id) => self.accounts.retain(|a| a.id != id),
            Change::PutTransaction(txn) => upsert(&mut self.transactions, txn, |t| t.id),
            Change::DeleteTransaction(id) => self.transactions.retain(|t| t.id != id),
            Change::PutRecurring(def) => upsert(&mut self.recurring, def, |d| d.id),
            Change::DeleteRecurring(id) => self.recurring.retain(|d| d.id != id),
            Change::PutInstallment(plan) => upsert(&mut self.installments, plan, |p| p.id),
            Change::DeleteInstallment(id) => self.installments.retain(|p| p.id != id),
            Change::PutSnapshot(snapshot) => upsert(&mut self.snapshots, snapshot, |s| s.date),
        }
    }
}

fn upsert<T, K: PartialEq>(records: &mut Vec<T>, record: T, key: impl Fn(&T) -> K) {
    let record_key = key(&record);
    match records.iter_mut().find(|existing| key(existing) == record_key) {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}
