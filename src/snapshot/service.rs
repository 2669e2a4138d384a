//! Bounded-retry operations against a [`Ledger`].
//!
//! Each public write runs "read snapshot, derive new snapshot, swap" up to
//! `ledger.retry_count()` times. Validation failures escape on first
//! detection; running out of attempts returns `Ok(false)`.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{Account, AccountSet, Ledger, LedgerError};
use crate::Amount;

/// Creates, funds and looks up accounts.
#[derive(Debug, Clone)]
pub struct AccountService {
    ledger: Arc<Ledger>,
}

impl AccountService {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }

    /// Add a zero-balance account.
    pub fn create_account(&self, id: &str) -> Result<bool, LedgerError> {
        if self.ledger.snapshot().contains(id) {
            return Err(LedgerError::AccountAlreadyExists(id.to_string()));
        }

        let installed = retry(self.ledger.retry_count(), |attempt| {
            let current = self.ledger.snapshot();
            if current.contains(id) {
                return Err(LedgerError::AccountAlreadyExists(id.to_string()));
            }
            let next = current.new_version([Account::new(id)]);
            let swapped = self.ledger.replace_snapshot(&current, next);
            if !swapped {
                debug!(account = id, attempt, "create lost snapshot race");
            }
            Ok(swapped)
        })?;
        if !installed {
            warn!(
                account = id,
                retries = self.ledger.retry_count(),
                "could not create account"
            );
        }
        Ok(installed)
    }

    /// The account as it stands in the current snapshot.
    pub fn get_account(&self, id: &str) -> Option<Account> {
        self.ledger.snapshot().get(id).cloned()
    }

    /// Credit `amount` to a single account.
    pub fn deposit(&self, id: &str, amount: Amount) -> Result<bool, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }

        existing(&self.ledger.snapshot(), id)?;

        let installed = retry(self.ledger.retry_count(), |attempt| {
            let current = self.ledger.snapshot();
            let account = existing(&current, id)?;
            let next = current.new_version([account.adjust_balance(amount)?]);
            let swapped = self.ledger.replace_snapshot(&current, next);
            if !swapped {
                debug!(account = id, %amount, attempt, "deposit lost snapshot race");
            }
            Ok::<bool, LedgerError>(swapped)
        })?;
        if !installed {
            warn!(account = id, %amount, "could not deposit");
        }
        Ok(installed)
    }
}

/// Moves balance between two accounts of the same snapshot.
#[derive(Debug, Clone)]
pub struct TransferService {
    ledger: Arc<Ledger>,
}

impl TransferService {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }

    /// Debit `from` and credit `to` by `amount` in one snapshot swap.
    ///
    /// Balances may go negative; there is no sufficiency check here.
    pub fn transfer_balance(
        &self,
        from: &str,
        to: &str,
        amount: Amount,
    ) -> Result<bool, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if from == to {
            return Err(LedgerError::SameAccount(from.to_string()));
        }
        let current = self.ledger.snapshot();
        existing(&current, from)?;
        existing(&current, to)?;

        let installed = retry(self.ledger.retry_count(), |attempt| {
            let swapped = self.transfer_attempt(from, to, amount)?;
            if !swapped {
                debug!(from, to, %amount, attempt, "transfer lost snapshot race");
            }
            Ok::<bool, LedgerError>(swapped)
        })?;
        if !installed {
            warn!(
                from,
                to,
                %amount,
                retries = self.ledger.retry_count(),
                "could not transfer balance"
            );
        }
        Ok(installed)
    }

    fn transfer_attempt(&self, from: &str, to: &str, amount: Amount) -> Result<bool, LedgerError> {
        let current = self.ledger.snapshot();
        let source = existing(&current, from)?;
        let destination = existing(&current, to)?;

        let next = current.new_version([
            source.adjust_balance(-amount)?,
            destination.adjust_balance(amount)?,
        ]);
        Ok(self.ledger.replace_snapshot(&current, next))
    }
}

fn existing<'a>(accounts: &'a AccountSet, id: &str) -> Result<&'a Account, LedgerError> {
    accounts
        .get(id)
        .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
}

/// Run `step` until it reports success, an error, or `attempts` runs out.
fn retry<E>(attempts: usize, mut step: impl FnMut(usize) -> Result<bool, E>) -> Result<bool, E> {
    for attempt in 1..=attempts {
        if step(attempt)? {
            return Ok(true);
        }
    }
    Ok(false)
}
