#![doc(test(attr(deny(warnings))))]

//! Dompet Core offers the ledger and automation primitives behind a personal
//! finance tracker: a double-entry balance model, a recurring-transaction
//! scheduler, billing-date pattern resolution, installment (cicilan) tracking,
//! credit-card billing math, and a balance-integrity auditor.

pub mod domain;
pub mod errors;
pub mod money;
pub mod schedule;
pub mod services;
pub mod store;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::from_default_env().add_directive("dompet_core=info".parse().unwrap());

        fmt().with_env_filter(filter).init();
        tracing::info!("Dompet Core tracing initialized.");
    });
}
