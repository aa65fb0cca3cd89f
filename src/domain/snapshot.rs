use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::account::AccountKind;

/// Date-keyed net-worth rollup; at most one exists per calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetWorthSnapshot {
    pub date: NaiveDate,
    pub total_assets: i64,
    pub total_liabilities: i64,
    pub net_worth: i64,
    /// Summed balances per account kind, category accounts excluded.
    #[serde(default)]
    pub breakdown: BTreeMap<AccountKind, i64>,
}
