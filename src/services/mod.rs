pub mod account_service;
pub mod audit_service;
pub mod billing_service;
pub mod installment_service;
pub mod networth_service;
pub mod posting_service;
pub mod recurring_service;

pub use account_service::AccountService;
pub use audit_service::{AuditReport, AuditService, Drift};
pub use billing_service::{BillingService, BillingStatement};
pub use installment_service::InstallmentService;
pub use networth_service::NetWorthService;
pub use posting_service::{PostOutcome, PostingService};
pub use recurring_service::{RecurringService, RunFailure, RunReport};
