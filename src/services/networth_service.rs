//! Net-worth rollups over the non-category accounts.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{AccountKind, NetWorthSnapshot};
use crate::errors::CoreResult;
use crate::store::{Batch, Change, LedgerStore};

pub struct NetWorthService;

impl NetWorthService {
    /// Computes totals from the current balances of every non-category
    /// account and upserts the date-keyed snapshot. Re-running on the same
    /// day replaces the earlier snapshot.
    pub fn snapshot(store: &mut dyn LedgerStore, date: NaiveDate) -> CoreResult<NetWorthSnapshot> {
        let mut total_assets = 0i64;
        let mut total_liabilities = 0i64;
        let mut breakdown: BTreeMap<AccountKind, i64> = BTreeMap::new();

        for account in store.accounts() {
            if account.kind.is_category() {
                continue;
            }
            *breakdown.entry(account.kind).or_insert(0) += account.current_balance;
            match account.kind {
                AccountKind::Bank | AccountKind::EWallet | AccountKind::Cash => {
                    total_assets += account.current_balance;
                }
                AccountKind::CreditCard => {
                    // Card debt is a negative balance; a positive balance is
                    // an overpayment and no liability at all.
                    total_liabilities += (-account.current_balance).max(0);
                }
                AccountKind::Expense | AccountKind::Income => {}
            }
        }

        let snapshot = NetWorthSnapshot {
            date,
            total_assets,
            total_liabilities,
            net_worth: total_assets - total_liabilities,
            breakdown,
        };
        store.apply(Batch::single(Change::PutSnapshot(snapshot.clone())))?;
        tracing::info!(
            %date,
            assets = total_assets,
            liabilities = total_liabilities,
            "net-worth snapshot recorded"
        );
        Ok(snapshot)
    }
}
