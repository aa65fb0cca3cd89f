pub mod account;
pub mod installment;
pub mod recurring;
pub mod snapshot;
pub mod transaction;

pub use account::{Account, AccountKind, CardConfig, FeeAutomation};
pub use installment::{InstallmentPlan, InstallmentStatus};
pub use recurring::{Direction, Frequency, RecurringDefinition};
pub use snapshot::NetWorthSnapshot;
pub use transaction::{IdempotencyKey, Transaction, TransactionDraft};
