//! Recurring-transaction scheduler.
//!
//! `run_due` is a synchronous, re-entrant-safe pass intended to run once per
//! process activation per day. The per-definition `last_executed_at` check is
//! only a fast path; the idempotency key enforced by the store is what makes
//! overlapping invocations safe.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{
    Direction, FeeAutomation, IdempotencyKey, RecurringDefinition, TransactionDraft,
};
use crate::errors::{CoreError, CoreResult};
use crate::schedule::next_due_date;
use crate::services::{AccountService, PostOutcome, PostingService};
use crate::store::{Batch, Change, LedgerStore};

/// Category label used for automated account fees.
const ADMIN_FEE_CATEGORY: &str = "Biaya Admin";
/// Upper bound on fee catch-up iterations per account per run.
const MAX_FEE_CATCHUP: usize = 240;

/// Outcome of one scheduler pass. Failures are per-item and never abort
/// sibling processing.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub executed: Vec<Uuid>,
    pub skipped: Vec<Uuid>,
    pub failures: Vec<RunFailure>,
}

#[derive(Debug, Clone)]
pub struct RunFailure {
    /// The definition or account the failure belongs to.
    pub source: Uuid,
    pub message: String,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct RecurringService;

impl RecurringService {
    /// Creates a definition after validating it and its target account.
    pub fn create(
        store: &mut dyn LedgerStore,
        definition: RecurringDefinition,
    ) -> CoreResult<Uuid> {
        definition.validate()?;
        if store.account(definition.account_id).is_none() {
            return Err(CoreError::NotFound(format!(
                "account {} not found",
                definition.account_id
            )));
        }
        let id = definition.id;
        store.apply(Batch::single(Change::PutRecurring(definition)))?;
        Ok(id)
    }

    pub fn set_active(store: &mut dyn LedgerStore, id: Uuid, active: bool) -> CoreResult<()> {
        let mut definition = Self::get(store, id)?;
        definition.active = active;
        store.apply(Batch::single(Change::PutRecurring(definition)))
    }

    /// Marks the month containing `reference` as skipped for the definition.
    pub fn skip_month(
        store: &mut dyn LedgerStore,
        id: Uuid,
        reference: NaiveDate,
    ) -> CoreResult<()> {
        let mut definition = Self::get(store, id)?;
        definition.skip_month(reference);
        store.apply(Batch::single(Change::PutRecurring(definition)))
    }

    /// Deletes a definition, clearing any account fee automation linked to it
    /// in the same atomic batch.
    pub fn delete(store: &mut dyn LedgerStore, id: Uuid) -> CoreResult<()> {
        Self::get(store, id)?;
        let mut batch = Batch::new();
        for mut account in store.accounts() {
            let linked = account
                .fee_automation
                .as_ref()
                .and_then(|fee| fee.recurring_id)
                == Some(id);
            if linked {
                account.fee_automation = None;
                batch.push(Change::PutAccount(account));
            }
        }
        batch.push(Change::DeleteRecurring(id));
        store.apply(batch)
    }

    /// Executes every definition and fee automation due on `reference`.
    pub fn run_due(store: &mut dyn LedgerStore, reference: NaiveDate) -> RunReport {
        let mut report = RunReport::default();

        for definition in store.recurring_definitions() {
            if !definition.active {
                continue;
            }
            if definition.is_expired(reference) {
                let mut expired = definition.clone();
                expired.active = false;
                if let Err(err) = store.apply(Batch::single(Change::PutRecurring(expired))) {
                    report.record_failure(definition.id, err);
                } else {
                    report.skipped.push(definition.id);
                }
                continue;
            }
            if definition.last_executed_at == Some(reference)
                || definition.is_month_skipped(reference)
            {
                report.skipped.push(definition.id);
                continue;
            }
            if !definition.is_due_on(reference) {
                continue;
            }
            match Self::execute(store, &definition, reference) {
                Ok(PostOutcome::Posted(txn_id)) => report.executed.push(txn_id),
                Ok(PostOutcome::AlreadyApplied(_)) => report.skipped.push(definition.id),
                Err(err) => report.record_failure(definition.id, err),
            }
        }

        for account in store.accounts() {
            let Some(fee) = account.fee_automation.clone() else {
                continue;
            };
            if !fee.enabled {
                continue;
            }
            if let Err(err) = Self::charge_fees(store, account.id, &fee, reference, &mut report) {
                report.record_failure(account.id, err);
            }
        }

        tracing::info!(
            %reference,
            executed = report.executed.len(),
            skipped = report.skipped.len(),
            failures = report.failures.len(),
            "scheduler pass finished"
        );
        report
    }

    /// Posts one synthesized transaction and stamps the watermark atomically.
    fn execute(
        store: &mut dyn LedgerStore,
        definition: &RecurringDefinition,
        reference: NaiveDate,
    ) -> CoreResult<PostOutcome> {
        let category = AccountService::resolve_or_create_category(
            store,
            definition.direction,
            &definition.category,
        )?;
        let (debit, credit) = match definition.direction {
            Direction::Out => (category.id, definition.account_id),
            Direction::In => (definition.account_id, category.id),
        };
        let draft = TransactionDraft::new(
            definition.name.clone(),
            definition.amount,
            definition.category.clone(),
            reference,
            debit,
            credit,
        )
        .with_key(IdempotencyKey::recurring(definition.id, reference))
        .with_recurring(definition.id);

        let mut stamped = definition.clone();
        stamped.last_executed_at = Some(reference);

        let outcome =
            PostingService::post_with(store, draft, vec![Change::PutRecurring(stamped.clone())])?;
        if matches!(outcome, PostOutcome::AlreadyApplied(_)) {
            // The posting batch never ran; stamp the fast-path watermark now.
            store.apply(Batch::single(Change::PutRecurring(stamped)))?;
        }
        Ok(outcome)
    }

    /// Catches up every fee charge due on or before `reference`.
    ///
    /// The watermark is stamped after each posting rather than inside it; a
    /// crash in between is healed by the fee idempotency key on the next run.
    fn charge_fees(
        store: &mut dyn LedgerStore,
        account_id: Uuid,
        fee: &FeeAutomation,
        reference: NaiveDate,
        report: &mut RunReport,
    ) -> CoreResult<()> {
        let anchor = store
            .account(account_id)
            .ok_or_else(|| CoreError::NotFound(format!("account {} not found", account_id)))?
            .created_at
            .date_naive();
        let mut last_charged = fee.last_charged_at;

        for _ in 0..MAX_FEE_CATCHUP {
            let due = next_due_date(&fee.pattern, anchor, last_charged)?;
            if due > reference {
                break;
            }
            let account = store
                .account(account_id)
                .ok_or_else(|| CoreError::NotFound(format!("account {} not found", account_id)))?;
            let category = AccountService::resolve_or_create_category(
                store,
                Direction::Out,
                ADMIN_FEE_CATEGORY,
            )?;
            let draft = TransactionDraft::new(
                format!("{} {}", ADMIN_FEE_CATEGORY, account.name),
                fee.amount_minor,
                ADMIN_FEE_CATEGORY,
                due,
                category.id,
                account.id,
            )
            .with_key(IdempotencyKey::fee(account.id, due));

            match PostingService::post(store, draft)? {
                PostOutcome::Posted(txn_id) => report.executed.push(txn_id),
                PostOutcome::AlreadyApplied(_) => report.skipped.push(account_id),
            }

            let mut stamped = store
                .account(account_id)
                .ok_or_else(|| CoreError::NotFound(format!("account {} not found", account_id)))?;
            if let Some(auto) = stamped.fee_automation.as_mut() {
                auto.last_charged_at = Some(due);
            }
            store.apply(Batch::single(Change::PutAccount(stamped)))?;
            last_charged = Some(due);
        }
        Ok(())
    }

    fn get(store: &dyn LedgerStore, id: Uuid) -> CoreResult<RecurringDefinition> {
        store.recurring(id).ok_or_else(|| {
            CoreError::NotFound(format!("recurring definition {} not found", id))
        })
    }
}

impl RunReport {
    fn record_failure(&mut self, source: Uuid, err: CoreError) {
        tracing::warn!(%source, error = %err, "scheduler item failed");
        self.failures.push(RunFailure {
            source,
            message: err.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, AccountKind, Frequency};
    use crate::schedule::BillingPattern;
    use crate::store::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store_with_bank() -> (MemoryStore, Uuid) {
        let mut store = MemoryStore::new();
        let bank = Account::new("BCA", AccountKind::Bank, 10_000_000);
        let id = AccountService::create(&mut store, bank).unwrap();
        (store, id)
    }

    fn monthly_definition(account_id: Uuid, day: u32) -> RecurringDefinition {
        RecurringDefinition::new(
            "Netflix",
            186_000,
            "Langganan",
            Direction::Out,
            account_id,
            Frequency::Monthly { day },
            date(2025, 1, 1),
        )
    }

    #[test]
    fn running_twice_on_same_day_posts_once() {
        let (mut store, bank) = store_with_bank();
        RecurringService::create(&mut store, monthly_definition(bank, 5)).unwrap();

        let first = RecurringService::run_due(&mut store, date(2025, 8, 5));
        let second = RecurringService::run_due(&mut store, date(2025, 8, 5));

        assert_eq!(first.executed.len(), 1);
        assert!(second.executed.is_empty());
        assert_eq!(store.transactions().len(), 1);
        assert_eq!(store.account(bank).unwrap().current_balance, 9_814_000);
    }

    #[test]
    fn duplicate_key_guards_even_without_watermark() {
        // Simulate a second tab whose definition copy predates the stamp.
        let (mut store, bank) = store_with_bank();
        let def = monthly_definition(bank, 5);
        let def_id = RecurringService::create(&mut store, def).unwrap();
        RecurringService::run_due(&mut store, date(2025, 8, 5));

        let mut stale = store.recurring(def_id).unwrap();
        stale.last_executed_at = None;
        store
            .apply(Batch::single(Change::PutRecurring(stale)))
            .unwrap();

        let report = RecurringService::run_due(&mut store, date(2025, 8, 5));
        assert!(report.executed.is_empty());
        assert_eq!(store.transactions().len(), 1);
    }

    #[test]
    fn creates_category_account_on_first_use() {
        let (mut store, bank) = store_with_bank();
        RecurringService::create(&mut store, monthly_definition(bank, 5)).unwrap();
        RecurringService::run_due(&mut store, date(2025, 8, 5));
        let category = store
            .account_by_name("[OUT] Langganan")
            .expect("category auto-created");
        assert_eq!(category.kind, AccountKind::Expense);
        assert_eq!(category.current_balance, 186_000);
    }

    #[test]
    fn income_direction_reverses_the_pairing() {
        let (mut store, bank) = store_with_bank();
        let mut def = monthly_definition(bank, 25);
        def.direction = Direction::In;
        def.category = "Gaji".into();
        def.amount = 7_500_000;
        RecurringService::create(&mut store, def).unwrap();
        RecurringService::run_due(&mut store, date(2025, 8, 25));
        assert_eq!(store.account(bank).unwrap().current_balance, 17_500_000);
        let category = store.account_by_name("[IN] Gaji").unwrap();
        assert_eq!(category.kind, AccountKind::Income);
        assert_eq!(category.current_balance, -7_500_000);
    }

    #[test]
    fn one_failing_definition_does_not_abort_others() {
        let (mut store, bank) = store_with_bank();
        let mut orphan = monthly_definition(bank, 5);
        orphan.account_id = Uuid::new_v4();
        orphan.name = "Orphan".into();
        // Bypass create() validation to seed the broken reference.
        store
            .apply(Batch::single(Change::PutRecurring(orphan.clone())))
            .unwrap();
        RecurringService::create(&mut store, monthly_definition(bank, 5)).unwrap();

        let report = RecurringService::run_due(&mut store, date(2025, 8, 5));
        assert_eq!(report.executed.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source, orphan.id);
    }

    #[test]
    fn expired_definition_is_deactivated_not_run() {
        let (mut store, bank) = store_with_bank();
        let def = monthly_definition(bank, 5).with_end_date(date(2025, 7, 31));
        let id = RecurringService::create(&mut store, def).unwrap();
        let report = RecurringService::run_due(&mut store, date(2025, 8, 5));
        assert!(report.executed.is_empty());
        assert!(!store.recurring(id).unwrap().active);
    }

    #[test]
    fn skipped_month_suppresses_execution() {
        let (mut store, bank) = store_with_bank();
        let id = RecurringService::create(&mut store, monthly_definition(bank, 5)).unwrap();
        RecurringService::skip_month(&mut store, id, date(2025, 8, 1)).unwrap();

        let august = RecurringService::run_due(&mut store, date(2025, 8, 5));
        assert!(august.executed.is_empty());
        let september = RecurringService::run_due(&mut store, date(2025, 9, 5));
        assert_eq!(september.executed.len(), 1);
    }

    #[test]
    fn fee_automation_catches_up_from_its_anchor() {
        let mut store = MemoryStore::new();
        let mut account = Account::new("Jenius", AccountKind::Bank, 1_000_000).with_fee_automation(
            FeeAutomation::new(10_000, BillingPattern::FixedDay { day: 28 }),
        );
        // Pin the anchor so the catch-up window is deterministic.
        account.created_at = date(2025, 6, 1).and_hms_opt(0, 0, 0).unwrap().and_utc();
        let id = AccountService::create(&mut store, account).unwrap();

        let report = RecurringService::run_due(&mut store, date(2025, 8, 28));
        assert!(report.is_clean());
        // June, July, and August charges were all due.
        assert_eq!(report.executed.len(), 3);
        let stored = store.account(id).unwrap();
        assert_eq!(stored.current_balance, 970_000);
        assert_eq!(
            stored.fee_automation.unwrap().last_charged_at,
            Some(date(2025, 8, 28))
        );
    }

    #[test]
    fn delete_cascades_to_linked_fee_automation() {
        let (mut store, bank) = store_with_bank();
        let def_id = RecurringService::create(&mut store, monthly_definition(bank, 5)).unwrap();
        let mut account = store.account(bank).unwrap();
        let mut fee = FeeAutomation::new(10_000, BillingPattern::FixedDay { day: 28 });
        fee.recurring_id = Some(def_id);
        account.fee_automation = Some(fee);
        store
            .apply(Batch::single(Change::PutAccount(account)))
            .unwrap();

        RecurringService::delete(&mut store, def_id).unwrap();
        assert!(store.recurring(def_id).is_none());
        assert!(store.account(bank).unwrap().fee_automation.is_none());
    }
}
