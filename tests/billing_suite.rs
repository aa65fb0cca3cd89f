use chrono::NaiveDate;
use dompet_core::{
    domain::{
        Account, AccountKind, CardConfig, InstallmentPlan, InstallmentStatus, TransactionDraft,
    },
    services::{AccountService, BillingService, InstallmentService, PostingService},
    store::{LedgerStore, MemoryStore},
};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A credit card closing on the 15th and due on the 5th, plus an expense
/// account to spend against.
fn card_setup() -> (MemoryStore, Uuid, Uuid) {
    let mut store = MemoryStore::new();
    let card = Account::new("Kartu BCA", AccountKind::CreditCard, 0)
        .with_card(CardConfig::new(15, 5));
    let card_id = AccountService::create(&mut store, card).expect("card account");
    let expense = AccountService::create(
        &mut store,
        Account::new("[OUT] Belanja", AccountKind::Expense, 0),
    )
    .expect("expense account");
    (store, card_id, expense)
}

#[test]
fn statement_separates_installments_from_purchases_and_fees() {
    let (mut store, card_id, expense) = card_setup();
    let plan = InstallmentPlan::new("HP baru", 3_600_000, 12, 300_000, 10, card_id, expense);
    let plan_id = InstallmentService::create(&mut store, plan).unwrap();
    InstallmentService::pay(&mut store, plan_id, date(2025, 8, 10)).expect("monthly payment");
    PostingService::post(
        &mut store,
        TransactionDraft::new(
            "groceries",
            450_000,
            "Belanja",
            date(2025, 8, 12),
            expense,
            card_id,
        ),
    )
    .unwrap();
    PostingService::post(
        &mut store,
        TransactionDraft::new(
            "annual fee",
            150_000,
            "Iuran Tahunan",
            date(2025, 8, 14),
            expense,
            card_id,
        ),
    )
    .unwrap();

    let statement = BillingService::calculate(&store, card_id, date(2025, 8, 20)).unwrap();
    assert_eq!(statement.period_start, date(2025, 7, 16));
    assert_eq!(statement.period_end, date(2025, 8, 15));
    assert_eq!(statement.installments.len(), 1);
    assert_eq!(statement.purchases.len(), 1);
    assert_eq!(statement.fees.len(), 1);
    assert_eq!(statement.full_payment, 900_000);
}

#[test]
fn paying_the_card_shrinks_the_full_payment() {
    let (mut store, card_id, expense) = card_setup();
    let bank = AccountService::create(
        &mut store,
        Account::new("BCA", AccountKind::Bank, 5_000_000),
    )
    .unwrap();
    PostingService::post(
        &mut store,
        TransactionDraft::new(
            "belanja",
            800_000,
            "Belanja",
            date(2025, 8, 1),
            expense,
            card_id,
        ),
    )
    .unwrap();
    PostingService::post(
        &mut store,
        TransactionDraft::new(
            "bayar kartu",
            500_000,
            "Transfer",
            date(2025, 8, 2),
            card_id,
            bank,
        ),
    )
    .unwrap();

    let statement = BillingService::calculate(&store, card_id, date(2025, 8, 20)).unwrap();
    assert_eq!(statement.full_payment, 300_000);
}

#[test]
fn installment_plan_settles_after_full_tenor_of_payments() {
    let (mut store, card_id, expense) = card_setup();
    let plan = InstallmentPlan::new("Kulkas", 2_400_000, 4, 600_000, 10, card_id, expense);
    let plan_id = InstallmentService::create(&mut store, plan).unwrap();

    for month in 1..=4u32 {
        InstallmentService::pay(&mut store, plan_id, date(2025, month, 10)).expect("payment");
    }
    let plan = store.installment(plan_id).unwrap();
    assert_eq!(plan.status, InstallmentStatus::Lunas);
    assert_eq!(store.account(card_id).unwrap().current_balance, -2_400_000);
    assert!(InstallmentService::pay(&mut store, plan_id, date(2025, 5, 10)).is_err());
}

#[test]
fn accelerated_payoff_posts_once_and_shows_on_the_statement() {
    let (mut store, card_id, expense) = card_setup();
    let plan = InstallmentPlan::new("Sofa", 3_000_000, 6, 500_000, 10, card_id, expense);
    let plan_id = InstallmentService::create(&mut store, plan).unwrap();
    InstallmentService::pay(&mut store, plan_id, date(2025, 7, 10)).unwrap();

    let txn_id = InstallmentService::accelerate(&mut store, plan_id, date(2025, 8, 1)).unwrap();
    assert_eq!(store.transaction(txn_id).unwrap().amount, 2_500_000);

    let statement = BillingService::calculate(&store, card_id, date(2025, 8, 20)).unwrap();
    assert_eq!(statement.installments.len(), 1);
    assert_eq!(statement.installments[0].id, txn_id);
    assert_eq!(statement.full_payment, 3_000_000);
}

#[test]
fn minimum_and_late_fee_follow_the_card_configuration() {
    let mut card = CardConfig::new(15, 5);
    card.min_payment_bps = 1_000; // 10%
    card.min_payment_floor = 50_000;
    card.late_fee_bps = 300; // 3%
    let mut store = MemoryStore::new();
    let card_id = AccountService::create(
        &mut store,
        Account::new("Kartu", AccountKind::CreditCard, 0).with_card(card),
    )
    .unwrap();
    let expense = AccountService::create(
        &mut store,
        Account::new("[OUT] Belanja", AccountKind::Expense, 0),
    )
    .unwrap();
    PostingService::post(
        &mut store,
        TransactionDraft::new(
            "belanja",
            4_000_000,
            "Belanja",
            date(2025, 8, 1),
            expense,
            card_id,
        ),
    )
    .unwrap();

    let on_time = BillingService::calculate(&store, card_id, date(2025, 9, 5)).unwrap();
    assert_eq!(on_time.minimum_payment, 400_000);
    assert_eq!(on_time.late_fee, 0);

    let late = BillingService::calculate(&store, card_id, date(2025, 9, 12)).unwrap();
    assert_eq!(late.days_past_due, 7);
    assert_eq!(late.late_fee, 120_000);
}
