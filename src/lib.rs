//! Personal-finance ledger engine: named accounts holding ordered lists of
//! payments and direction-bound transfers, with derived balances and views
//! and one write-through JSON file per account.

pub mod bank;
pub mod cli;
pub mod errors;
pub mod storage;
pub mod transaction;
pub mod validation;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing with sensible defaults.
pub fn init() {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::from_default_env().add_directive("bank_core=info".parse().unwrap());

        fmt().with_env_filter(filter).init();
    });
}
