//! Copy-on-write snapshot ledger.
//!
//! The whole account set lives behind a single compare-and-swap cell. Every
//! write reads the current snapshot, derives a new one and installs it only
//! if nobody else installed a different snapshot in the meantime. Installs
//! therefore form one total order.

use std::sync::Arc;

use arc_swap::ArcSwap;

mod account;
pub use account::Account;

mod account_set;
pub use account_set::AccountSet;

mod error;
pub use error::LedgerError;

mod service;
pub use service::{AccountService, TransferService};

pub const DEFAULT_RETRY_COUNT: usize = 10;

/// Holder of the current snapshot plus the retry budget shared by services.
#[derive(Debug)]
pub struct Ledger {
    accounts: ArcSwap<AccountSet>,
    retry_count: usize,
}

impl Ledger {
    pub fn new(retry_count: usize) -> Self {
        Self {
            accounts: ArcSwap::from_pointee(AccountSet::new()),
            retry_count,
        }
    }

    pub fn retry_count(&self) -> usize {
        self.retry_count
    }

    /// The snapshot that is current right now.
    pub fn snapshot(&self) -> Arc<AccountSet> {
        self.accounts.load_full()
    }

    /// Install `replacement` if `expected` is still the current snapshot.
    ///
    /// Comparison is by identity, not content: a content-equal snapshot
    /// installed by someone else still makes this fail.
    pub fn replace_snapshot(&self, expected: &Arc<AccountSet>, replacement: AccountSet) -> bool {
        let previous = self
            .accounts
            .compare_and_swap(expected, Arc::new(replacement));
        Arc::ptr_eq(&*previous, expected)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_COUNT)
    }
}
