//! Error types for logged accounts.

use thiserror::Error;

use super::BalanceLogStatus;
use crate::Amount;
use crate::amount::AmountOverflow;
use crate::model::AccountId;

/// Error while appending an adjustment to one account.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdjustmentError {
    #[error("account {account} has insufficient balance ({available}) for withdrawal of {requested}")]
    InsufficientBalance {
        account: AccountId,
        available: Amount,
        requested: Amount,
    },

    #[error(transparent)]
    AmountOverflow(#[from] AmountOverflow),
}

/// Error returned by [`TransferService`](super::TransferService).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("transfer amount {0} must be positive")]
    InvalidAmount(Amount),

    #[error("may not transfer back to the same account {0}")]
    SameAccount(AccountId),

    #[error(transparent)]
    Adjustment(#[from] AdjustmentError),

    #[error("could not transfer balance with {attempts} tries")]
    RetryBudgetExhausted { attempts: usize },

    /// The attempt's marker was resolved by someone else before both legs
    /// landed. Never expected in correct operation.
    #[error("transfer status was {status} before transfer was completed")]
    InternalConsistencyViolation { status: BalanceLogStatus },
}
