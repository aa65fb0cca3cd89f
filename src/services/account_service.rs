//! Account CRUD and deterministic category-account resolution.

use uuid::Uuid;

use crate::domain::{Account, AccountKind, Direction};
use crate::errors::{CoreError, CoreResult};
use crate::store::{Batch, Change, LedgerStore};

pub struct AccountService;

impl AccountService {
    /// Creates an account after validating its configuration and name.
    pub fn create(store: &mut dyn LedgerStore, account: Account) -> CoreResult<Uuid> {
        account.validate()?;
        Self::ensure_name_free(store, &account.name, None)?;
        let id = account.id;
        store.apply(Batch::single(Change::PutAccount(account)))?;
        Ok(id)
    }

    /// Updates an account's metadata. The stored running balance is preserved;
    /// only postings and [`crate::services::AuditService::repair`] may move it.
    pub fn update(store: &mut dyn LedgerStore, mut account: Account) -> CoreResult<()> {
        let existing = store
            .account(account.id)
            .ok_or_else(|| CoreError::NotFound(format!("account {} not found", account.id)))?;
        account.validate()?;
        Self::ensure_name_free(store, &account.name, Some(account.id))?;
        account.current_balance = existing.current_balance;
        store.apply(Batch::single(Change::PutAccount(account)))?;
        Ok(())
    }

    /// Deletes an account, refusing while any record still references it.
    pub fn delete(store: &mut dyn LedgerStore, id: Uuid) -> CoreResult<()> {
        if store.account(id).is_none() {
            return Err(CoreError::NotFound(format!("account {} not found", id)));
        }
        let referenced = store
            .transactions()
            .iter()
            .any(|txn| txn.debit_account == id || txn.credit_account == id)
            || store
                .recurring_definitions()
                .iter()
                .any(|def| def.account_id == id)
            || store
                .installments()
                .iter()
                .any(|plan| plan.credit_account == id || plan.debit_account == id);
        if referenced {
            return Err(CoreError::Conflict(format!(
                "account {} still has linked transactions, definitions, or plans",
                id
            )));
        }
        store.apply(Batch::single(Change::DeleteAccount(id)))
    }

    /// Returns the category account for a direction + label, creating it with
    /// zero balances on first use. Names are deterministic, e.g. `[OUT] Makan`.
    pub fn resolve_or_create_category(
        store: &mut dyn LedgerStore,
        direction: Direction,
        label: &str,
    ) -> CoreResult<Account> {
        let name = category_name(direction, label);
        if let Some(existing) = store.account_by_name(&name) {
            return Ok(existing);
        }
        let kind = match direction {
            Direction::Out => AccountKind::Expense,
            Direction::In => AccountKind::Income,
        };
        let account = Account::new(name, kind, 0);
        store.apply(Batch::single(Change::PutAccount(account.clone())))?;
        tracing::info!(account = %account.id, name = account.name, "category account created");
        Ok(account)
    }

    fn ensure_name_free(
        store: &dyn LedgerStore,
        candidate: &str,
        exclude: Option<Uuid>,
    ) -> CoreResult<()> {
        match store.account_by_name(candidate) {
            Some(existing) if exclude != Some(existing.id) => Err(CoreError::Conflict(format!(
                "account `{}` already exists",
                candidate
            ))),
            _ => Ok(()),
        }
    }
}

/// Deterministic category-account name for a direction + category label.
pub fn category_name(direction: Direction, label: &str) -> String {
    format!("[{}] {}", direction.label(), label.trim())
}
