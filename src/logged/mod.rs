//! Accounts backed by an append-only adjustment log.
//!
//! Each account owns one compare-and-swap cell holding a [`Balance`]: a
//! settled value plus log entries. A transfer appends one entry to each
//! account, both pointing at the same [`BalanceLogState`]. Entries only count
//! once that shared marker completes, so the two legs take effect together
//! even though they land at different moments.
//!
//! There is no global order across accounts. An observer can see the first
//! leg appended before the second; it simply does not count yet.

mod state;
pub use state::{BalanceLogState, BalanceLogStatus};

mod entry;
pub use entry::BalanceLogEntry;

mod balance;
pub use balance::Balance;

mod account;
pub use account::{Account, AdjustBalance};

mod error;
pub use error::{AdjustmentError, TransferError};

mod transfer;
pub use transfer::{DEFAULT_RETRIES, TransferService};
