//! Installment (cicilan) lifecycle: payments, accelerated payoff, deletion.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{IdempotencyKey, InstallmentPlan, TransactionDraft};
use crate::errors::{CoreError, CoreResult};
use crate::services::{PostOutcome, PostingService};
use crate::store::{Batch, Change, LedgerStore};

pub struct InstallmentService;

impl InstallmentService {
    /// Registers a plan after validating it and both of its accounts.
    pub fn create(store: &mut dyn LedgerStore, plan: InstallmentPlan) -> CoreResult<Uuid> {
        plan.validate()?;
        for account_id in [plan.credit_account, plan.debit_account] {
            if store.account(account_id).is_none() {
                return Err(CoreError::NotFound(format!(
                    "account {} not found",
                    account_id
                )));
            }
        }
        let id = plan.id;
        store.apply(Batch::single(Change::PutInstallment(plan)))?;
        Ok(id)
    }

    /// Posts one monthly payment and advances the plan counter.
    pub fn pay(store: &mut dyn LedgerStore, plan_id: Uuid, date: NaiveDate) -> CoreResult<Uuid> {
        let plan = Self::active_plan(store, plan_id)?;
        let draft = TransactionDraft::new(
            format!("{} cicilan {}/{}", plan.product, plan.current_index, plan.tenor),
            plan.monthly_amount,
            "Cicilan",
            date,
            plan.debit_account,
            plan.credit_account,
        )
        .with_key(IdempotencyKey::installment(plan.id, plan.current_index))
        .with_installment(plan.id);

        let mut advanced = plan.clone();
        advanced.advance();
        match PostingService::post_with(store, draft, vec![Change::PutInstallment(advanced)])? {
            PostOutcome::Posted(txn_id) => Ok(txn_id),
            PostOutcome::AlreadyApplied(txn_id) => Err(CoreError::Conflict(format!(
                "installment {} payment {} already posted as {}",
                plan.id, plan.current_index, txn_id
            ))),
        }
    }

    /// Pays every remaining month in one posting and settles the plan.
    pub fn accelerate(
        store: &mut dyn LedgerStore,
        plan_id: Uuid,
        date: NaiveDate,
    ) -> CoreResult<Uuid> {
        let plan = Self::active_plan(store, plan_id)?;
        let remaining = plan.remaining_months();
        let amount = plan.monthly_amount * remaining as i64;
        // Index tenor + 1 is where a settled plan rests, so no monthly
        // payment can ever claim this key.
        let draft = TransactionDraft::new(
            format!("{} pelunasan {} bulan", plan.product, remaining),
            amount,
            "Cicilan",
            date,
            plan.debit_account,
            plan.credit_account,
        )
        .with_key(IdempotencyKey::installment(plan.id, plan.tenor + 1))
        .with_installment(plan.id);

        let mut settled = plan.clone();
        settled.settle();
        match PostingService::post_with(store, draft, vec![Change::PutInstallment(settled)])? {
            PostOutcome::Posted(txn_id) => {
                tracing::info!(plan = %plan.id, amount, "installment plan accelerated");
                Ok(txn_id)
            }
            PostOutcome::AlreadyApplied(txn_id) => Err(CoreError::Conflict(format!(
                "installment {} payoff already posted as {}",
                plan.id, txn_id
            ))),
        }
    }

    /// Removes a plan; refused while any transaction still references it.
    pub fn delete(store: &mut dyn LedgerStore, plan_id: Uuid) -> CoreResult<()> {
        if store.installment(plan_id).is_none() {
            return Err(CoreError::NotFound(format!(
                "installment plan {} not found",
                plan_id
            )));
        }
        if store
            .transactions()
            .iter()
            .any(|txn| txn.installment_id == Some(plan_id))
        {
            return Err(CoreError::Conflict(format!(
                "installment plan {} still has posted payments",
                plan_id
            )));
        }
        store.apply(Batch::single(Change::DeleteInstallment(plan_id)))
    }

    fn active_plan(store: &dyn LedgerStore, plan_id: Uuid) -> CoreResult<InstallmentPlan> {
        let plan = store.installment(plan_id).ok_or_else(|| {
            CoreError::NotFound(format!("installment plan {} not found", plan_id))
        })?;
        if !plan.is_active() || plan.current_index > plan.tenor {
            return Err(CoreError::Conflict(format!(
                "installment plan {} is not active",
                plan_id
            )));
        }
        Ok(plan)
    }
}
