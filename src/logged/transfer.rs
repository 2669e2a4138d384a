use std::sync::Arc;

use tracing::{debug, error, warn};

use super::{AdjustBalance, BalanceLogState, TransferError};
use crate::Amount;

pub const DEFAULT_RETRIES: usize = 10;

/// Two-leg transfers between logged accounts.
///
/// Both legs of an attempt are appended under one fresh marker. The marker is
/// completed once both legs are in, which makes both count at once on the
/// next read of either account. Any failed leg aborts the marker, so a leg
/// that did land is ignored forever.
#[derive(Debug, Clone, Copy)]
pub struct TransferService {
    retries: usize,
}

impl TransferService {
    pub fn new(retries: usize) -> Self {
        Self { retries }
    }

    pub fn retries(&self) -> usize {
        self.retries
    }

    pub fn transfer_balance<S, D>(
        &self,
        source: &S,
        destination: &D,
        amount: Amount,
    ) -> Result<(), TransferError>
    where
        S: AdjustBalance + ?Sized,
        D: AdjustBalance + ?Sized,
    {
        if !amount.is_positive() {
            return Err(TransferError::InvalidAmount(amount));
        }
        if source.account_id() == destination.account_id() {
            return Err(TransferError::SameAccount(source.account_id().to_string()));
        }

        for attempt in 1..=self.retries {
            let marker = Arc::new(BalanceLogState::new());
            if self.transfer_attempt(source, destination, amount, &marker)? {
                return Ok(());
            }
            debug!(
                from = source.account_id(),
                to = destination.account_id(),
                %amount,
                attempt,
                "transfer attempt aborted"
            );
        }

        warn!(
            from = source.account_id(),
            to = destination.account_id(),
            %amount,
            retries = self.retries,
            "could not transfer balance"
        );
        Err(TransferError::RetryBudgetExhausted {
            attempts: self.retries,
        })
    }

    /// One attempt under a caller-supplied marker.
    ///
    /// `Ok(false)` means a leg lost its race; the marker has been aborted.
    /// A leg error also aborts the marker before it is returned.
    pub fn transfer_attempt<S, D>(
        &self,
        source: &S,
        destination: &D,
        amount: Amount,
        marker: &Arc<BalanceLogState>,
    ) -> Result<bool, TransferError>
    where
        S: AdjustBalance + ?Sized,
        D: AdjustBalance + ?Sized,
    {
        let adjusted = match source.adjust_balance(-amount, marker) {
            Ok(true) => destination.adjust_balance(amount, marker),
            other => other,
        };

        match adjusted {
            Ok(true) => {}
            Ok(false) => {
                marker.abort();
                return Ok(false);
            }
            Err(e) => {
                marker.abort();
                return Err(e.into());
            }
        }

        Self::complete(marker)?;
        Ok(true)
    }

    /// Credit `amount` to one account as a single-leg adjustment.
    pub fn deposit<A>(&self, account: &A, amount: Amount) -> Result<(), TransferError>
    where
        A: AdjustBalance + ?Sized,
    {
        if !amount.is_positive() {
            return Err(TransferError::InvalidAmount(amount));
        }

        for attempt in 1..=self.retries {
            let marker = Arc::new(BalanceLogState::new());
            if account.adjust_balance(amount, &marker)? {
                return Self::complete(&marker);
            }
            marker.abort();
            debug!(account = account.account_id(), %amount, attempt, "deposit attempt aborted");
        }

        warn!(account = account.account_id(), %amount, "could not deposit");
        Err(TransferError::RetryBudgetExhausted {
            attempts: self.retries,
        })
    }

    fn complete(marker: &BalanceLogState) -> Result<(), TransferError> {
        if marker.complete() {
            return Ok(());
        }
        let status = marker.status();
        error!(%status, "marker resolved before its legs completed");
        Err(TransferError::InternalConsistencyViolation { status })
    }
}

impl Default for TransferService {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIES)
    }
}
