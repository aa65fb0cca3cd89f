use chrono::NaiveDate;
use dompet_core::{
    domain::{Account, AccountKind, Direction, TransactionDraft},
    services::{AccountService, AuditService, NetWorthService, PostingService},
    store::{Batch, Change, LedgerStore, MemoryStore},
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seeded_store() -> (MemoryStore, uuid::Uuid, uuid::Uuid) {
    let mut store = MemoryStore::new();
    let bank = AccountService::create(
        &mut store,
        Account::new("BCA", AccountKind::Bank, 10_000_000),
    )
    .expect("bank account");
    let wallet = AccountService::create(
        &mut store,
        Account::new("GoPay", AccountKind::EWallet, 500_000),
    )
    .expect("wallet account");
    (store, bank, wallet)
}

#[test]
fn posting_moves_both_balances_by_the_same_amount() {
    let (mut store, bank, wallet) = seeded_store();
    PostingService::post(
        &mut store,
        TransactionDraft::new(
            "top up",
            300_000,
            "Transfer",
            date(2025, 8, 1),
            wallet,
            bank,
        ),
    )
    .expect("post transfer");

    assert_eq!(store.account(bank).unwrap().current_balance, 9_700_000);
    assert_eq!(store.account(wallet).unwrap().current_balance, 800_000);
}

#[test]
fn a_stream_of_postings_keeps_the_audit_clean() {
    let (mut store, bank, wallet) = seeded_store();
    let makan = AccountService::resolve_or_create_category(&mut store, Direction::Out, "Makan")
        .expect("category");
    let gaji = AccountService::resolve_or_create_category(&mut store, Direction::In, "Gaji")
        .expect("category");

    PostingService::post(
        &mut store,
        TransactionDraft::new("gaji", 12_000_000, "Gaji", date(2025, 8, 25), bank, gaji.id),
    )
    .unwrap();
    PostingService::post(
        &mut store,
        TransactionDraft::new(
            "makan siang",
            65_000,
            "Makan",
            date(2025, 8, 26),
            makan.id,
            wallet,
        ),
    )
    .unwrap();
    PostingService::post(
        &mut store,
        TransactionDraft::new(
            "top up",
            200_000,
            "Transfer",
            date(2025, 8, 27),
            wallet,
            bank,
        ),
    )
    .unwrap();

    assert!(AuditService::audit(&store).is_clean());
    assert_eq!(store.account(bank).unwrap().current_balance, 21_800_000);
    assert_eq!(store.account(wallet).unwrap().current_balance, 635_000);
}

#[test]
fn repair_brings_a_tampered_balance_back_in_line() {
    let (mut store, bank, wallet) = seeded_store();
    PostingService::post(
        &mut store,
        TransactionDraft::new("move", 100_000, "Transfer", date(2025, 8, 1), wallet, bank),
    )
    .unwrap();

    let mut tampered = store.account(bank).unwrap();
    tampered.current_balance += 42;
    store
        .apply(Batch::single(Change::PutAccount(tampered)))
        .unwrap();
    assert_eq!(AuditService::audit(&store).drifts.len(), 1);

    AuditService::repair(&mut store).expect("repair");
    assert!(AuditService::audit(&store).is_clean());
    assert_eq!(store.account(bank).unwrap().current_balance, 9_900_000);
}

#[test]
fn net_worth_reflects_posted_activity() {
    let (mut store, _bank, _wallet) = seeded_store();
    let card = AccountService::create(
        &mut store,
        Account::new("Kartu", AccountKind::CreditCard, 0),
    )
    .unwrap();
    let belanja =
        AccountService::resolve_or_create_category(&mut store, Direction::Out, "Belanja").unwrap();
    PostingService::post(
        &mut store,
        TransactionDraft::new(
            "belanja",
            750_000,
            "Belanja",
            date(2025, 8, 10),
            belanja.id,
            card,
        ),
    )
    .unwrap();

    let snapshot = NetWorthService::snapshot(&mut store, date(2025, 8, 31)).expect("snapshot");
    assert_eq!(snapshot.total_assets, 10_500_000);
    assert_eq!(snapshot.total_liabilities, 750_000);
    assert_eq!(snapshot.net_worth, 9_750_000);
    assert!(store.snapshot(date(2025, 8, 31)).is_some());

    // Category accounts never count toward the totals.
    assert!(!snapshot.breakdown.contains_key(&AccountKind::Expense));
    assert_eq!(snapshot.breakdown[&AccountKind::Bank], 10_000_000);
}

#[test]
fn deleting_an_account_in_use_is_refused() {
    let (mut store, bank, wallet) = seeded_store();
    PostingService::post(
        &mut store,
        TransactionDraft::new("move", 100_000, "Transfer", date(2025, 8, 1), wallet, bank),
    )
    .unwrap();
    let err = AccountService::delete(&mut store, bank).expect_err("referenced account");
    assert!(err.is_conflict());
    assert!(store.account(bank).is_some());
}
