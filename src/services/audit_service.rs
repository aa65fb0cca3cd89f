//! Balance-integrity audit: recomputes every balance from raw ledger history.
//!
//! Drift is reported, never fixed as a side effect; only an explicit
//! [`AuditService::repair`] call overwrites stored balances.

use std::collections::HashMap;

use uuid::Uuid;

use crate::errors::CoreResult;
use crate::store::{Batch, Change, LedgerStore};

/// A stored balance that disagrees with the recomputed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    pub account_id: Uuid,
    pub name: String,
    pub stored: i64,
    pub computed: i64,
}

#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    pub drifts: Vec<Drift>,
    /// Human-readable warnings about records referencing missing accounts.
    pub orphans: Vec<String>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.drifts.is_empty() && self.orphans.is_empty()
    }
}

pub struct AuditService;

impl AuditService {
    /// Recomputes `opening_balance + Σdebit − Σcredit` for every account and
    /// reports mismatches and orphan references. Never writes.
    pub fn audit(store: &dyn LedgerStore) -> AuditReport {
        let accounts = store.accounts();
        let known: HashMap<Uuid, i64> = accounts
            .iter()
            .map(|account| (account.id, account.opening_balance))
            .collect();
        let mut computed = known.clone();
        let mut report = AuditReport::default();

        for txn in store.transactions() {
            match computed.get_mut(&txn.debit_account) {
                Some(balance) => *balance += txn.amount,
                None => report.orphans.push(format!(
                    "transaction {} references unknown debit account {}",
                    txn.id, txn.debit_account
                )),
            }
            match computed.get_mut(&txn.credit_account) {
                Some(balance) => *balance -= txn.amount,
                None => report.orphans.push(format!(
                    "transaction {} references unknown credit account {}",
                    txn.id, txn.credit_account
                )),
            }
        }
        for def in store.recurring_definitions() {
            if !known.contains_key(&def.account_id) {
                report.orphans.push(format!(
                    "recurring definition {} references unknown account {}",
                    def.id, def.account_id
                ));
            }
        }
        for plan in store.installments() {
            for account_id in [plan.credit_account, plan.debit_account] {
                if !known.contains_key(&account_id) {
                    report.orphans.push(format!(
                        "installment plan {} references unknown account {}",
                        plan.id, account_id
                    ));
                }
            }
        }

        for account in accounts {
            let expected = computed[&account.id];
            if expected != account.current_balance {
                tracing::warn!(
                    account = %account.id,
                    stored = account.current_balance,
                    computed = expected,
                    "balance drift detected"
                );
                report.drifts.push(Drift {
                    account_id: account.id,
                    name: account.name,
                    stored: account.current_balance,
                    computed: expected,
                });
            }
        }
        report
    }

    /// Overwrites every drifted balance with its recomputed value in one
    /// atomic batch. Returns the ids of the repaired accounts.
    pub fn repair(store: &mut dyn LedgerStore) -> CoreResult<Vec<Uuid>> {
        let report = Self::audit(store);
        if report.drifts.is_empty() {
            return Ok(Vec::new());
        }
        let mut batch = Batch::new();
        let mut repaired = Vec::new();
        for drift in &report.drifts {
            if let Some(mut account) = store.account(drift.account_id) {
                account.current_balance = drift.computed;
                batch.push(Change::PutAccount(account));
                repaired.push(drift.account_id);
            }
        }
        store.apply(batch)?;
        tracing::info!(count = repaired.len(), "balances repaired");
        Ok(repaired)
    }
}
