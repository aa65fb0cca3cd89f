use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{
    Account, IdempotencyKey, InstallmentPlan, NetWorthSnapshot, RecurringDefinition, Transaction,
};
use crate::errors::CoreResult;

use super::{Batch, Dataset, LedgerStore};

/// In-memory store; the default backend for tests and embedders that manage
/// persistence themselves.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Dataset,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing dataset, e.g. one loaded by the host application.
    pub fn from_dataset(data: Dataset) -> Self {
        Self { data }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.data
    }
}

impl LedgerStore for MemoryStore {
    fn account(&self, id: Uuid) -> Option<Account> {
        self.data.account(id).cloned()
    }

    fn account_by_name(&self, name: &str) -> Option<Account> {
        self.data.account_by_name(name).cloned()
    }

    fn accounts(&self) -> Vec<Account> {
        self.data.accounts.clone()
    }

    fn transaction(&self, id: Uuid) -> Option<Transaction> {
        self.data.transaction(id).cloned()
    }

    fn transactions(&self) -> Vec<Transaction> {
        self.data.transactions.clone()
    }

    fn transactions_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<Transaction> {
        self.data
            .transactions
            .iter()
            .filter(|txn| txn.date >= start && txn.date <= end)
            .cloned()
            .collect()
    }

    fn transaction_by_key(&self, key: &IdempotencyKey) -> Option<Transaction> {
        self.data.transaction_by_key(key).cloned()
    }

    fn recurring(&self, id: Uuid) -> Option<RecurringDefinition> {
        self.data.recurring(id).cloned()
    }

    fn recurring_definitions(&self) -> Vec<RecurringDefinition> {
        self.data.recurring.clone()
    }

    fn installment(&self, id: Uuid) -> Option<InstallmentPlan> {
        self.data.installment(id).cloned()
    }

    fn installments(&self) -> Vec<InstallmentPlan> {
        self.data.installments.clone()
    }

    fn snapshot(&self, date: NaiveDate) -> Option<NetWorthSnapshot> {
        self.data.snapshot(date).cloned()
    }

    fn snapshots(&self) -> Vec<NetWorthSnapshot> {
        self.data.snapshots.clone()
    }

    fn apply(&mut self, batch: Batch) -> CoreResult<()> {
        self.data.apply(batch)
    }
}
