//! Transaction posting with the double-entry balance invariant.
//!
//! Every posting inserts the transaction and adjusts both account balances in
//! one atomic batch; no code path updates a balance alone.

use uuid::Uuid;

use crate::domain::TransactionDraft;
use crate::errors::{CoreError, CoreResult};
use crate::store::{Batch, Change, LedgerStore};

/// Result of a posting attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// The transaction was created and both balances moved.
    Posted(Uuid),
    /// A transaction with the same idempotency key already exists; nothing
    /// was written. This is the retry-safety path, not a failure.
    AlreadyApplied(Uuid),
}

impl PostOutcome {
    pub fn transaction_id(&self) -> Uuid {
        match *self {
            PostOutcome::Posted(id) | PostOutcome::AlreadyApplied(id) => id,
        }
    }
}

pub struct PostingService;

impl PostingService {
    /// Posts a transaction, debiting and crediting the paired accounts.
    pub fn post(store: &mut dyn LedgerStore, draft: TransactionDraft) -> CoreResult<PostOutcome> {
        Self::post_with(store, draft, Vec::new())
    }

    /// Posts a transaction together with extra changes that must land in the
    /// same atomic group (e.g. stamping a scheduler watermark).
    ///
    /// `extra` must not touch the two balance-carrying account records; those
    /// are owned by this function.
    pub fn post_with(
        store: &mut dyn LedgerStore,
        draft: TransactionDraft,
        extra: Vec<Change>,
    ) -> CoreResult<PostOutcome> {
        draft.validate()?;

        let mut debit = store
            .account(draft.debit_account)
            .ok_or_else(|| CoreError::NotFound(format!("account {} not found", draft.debit_account)))?;
        let mut credit = store
            .account(draft.credit_account)
            .ok_or_else(|| {
                CoreError::NotFound(format!("account {} not found", draft.credit_account))
            })?;

        if let Some(key) = &draft.idempotency_key {
            if let Some(existing) = store.transaction_by_key(key) {
                tracing::debug!(key = key.as_str(), txn = %existing.id, "posting already applied");
                return Ok(PostOutcome::AlreadyApplied(existing.id));
            }
        }

        let txn = draft.into_transaction();
        debit.current_balance += txn.amount;
        credit.current_balance -= txn.amount;

        let mut batch = Batch::new();
        batch.push(Change::PutTransaction(txn.clone()));
        batch.push(Change::PutAccount(debit));
        batch.push(Change::PutAccount(credit));
        for change in extra {
            batch.push(change);
        }
        store.apply(batch)?;

        tracing::info!(
            txn = %txn.id,
            amount = txn.amount,
            debit = %txn.debit_account,
            credit = %txn.credit_account,
            "transaction posted"
        );
        Ok(PostOutcome::Posted(txn.id))
    }
}
