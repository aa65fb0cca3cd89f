use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{
    Account, IdempotencyKey, InstallmentPlan, NetWorthSnapshot, RecurringDefinition, Transaction,
};
use crate::errors::{CoreError, CoreResult};

use super::{Batch, Dataset, LedgerStore};

const TMP_SUFFIX: &str = "tmp";
const DEFAULT_APP_DIR: &str = "dompet";
const DEFAULT_FILE: &str = "ledger.json";

/// File-backed store persisting the whole dataset as one JSON document.
///
/// Every batch is applied to a working copy and written atomically (temp file
/// then rename) before it becomes visible, so a failed write never leaves a
/// half-applied dataset in memory or on disk.
#[derive(Debug, Clone)]
pub struct JsonStore {
    data: Dataset,
    path: PathBuf,
}

impl JsonStore {
    /// Opens (or initializes) a store at the given path.
    pub fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        let data = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            Dataset::default()
        };
        Ok(Self { data, path })
    }

    /// Opens the store at the platform's data directory.
    pub fn open_default() -> CoreResult<Self> {
        let base = dirs::data_dir().ok_or_else(|| {
            CoreError::Configuration("platform data directory is not available".into())
        })?;
        let dir = base.join(DEFAULT_APP_DIR);
        fs::create_dir_all(&dir)?;
        Self::open(dir.join(DEFAULT_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, data: &Dataset) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(data)?;
        let tmp = tmp_path(&self.path);
        let mut file = File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl LedgerStore for JsonStore {
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
        let mut next = self.data.clone();
        next.apply(batch)?;
        self.persist(&next)?;
        self.data = next;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}
