//! Error types for the snapshot ledger.

use thiserror::Error;

use crate::Amount;
use crate::amount::AmountOverflow;
use crate::model::AccountId;

/// Validation failures. These are raised on first detection and never retried;
/// losing a snapshot race is reported as `Ok(false)` instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount {0} must be positive")]
    InvalidAmount(Amount),

    #[error("may not transfer back to the same account {0}")]
    SameAccount(AccountId),

    #[error("account {0} does not exist")]
    AccountNotFound(AccountId),

    #[error("account {0} already exists")]
    AccountAlreadyExists(AccountId),

    #[error(transparent)]
    AmountOverflow(#[from] AmountOverflow),
}
