use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tracing::trace;

use super::{AdjustmentError, Balance, BalanceLogEntry, BalanceLogState};
use crate::Amount;
use crate::amount::AmountOverflow;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::model::AccountId;

/// Something a transfer leg can be applied to.
pub trait AdjustBalance {
    fn account_id(&self) -> &str;

    /// Append `delta` under `marker` with a single compare-and-swap.
    ///
    /// `Ok(false)` means the swap lost a race and nothing was appended.
    fn adjust_balance(
        &self,
        delta: Amount,
        marker: &Arc<BalanceLogState>,
    ) -> Result<bool, AdjustmentError>;
}

/// An account whose balance cell is swapped, never locked.
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    balance: ArcSwap<Balance>,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
}

impl Account {
    /// Zero-balance account on the system clock with the default staleness.
    pub fn new(id: impl Into<AccountId>) -> Self {
        Self::with_clock(id, Arc::new(SystemClock), Config::default().stale_after)
    }

    pub fn with_clock(
        id: impl Into<AccountId>,
        clock: Arc<dyn Clock>,
        stale_after: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            balance: ArcSwap::from_pointee(Balance::new(Amount::ZERO)),
            clock,
            stale_after,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current balance cell, log included.
    pub fn raw_balance(&self) -> Arc<Balance> {
        self.balance.load_full()
    }

    /// Effective balance. Compacts the log as a side effect: completed
    /// entries are folded, resolved and stale entries dropped.
    ///
    /// Appends are bounded by [`Balance::exposure`], so the fold only fails
    /// for a balance cell built outside [`AdjustBalance::adjust_balance`].
    pub fn get_balance(&self) -> Result<Amount, AmountOverflow> {
        let current = self.balance.load_full();
        let flattened = current.flatten_log(self.clock.now(), self.stale_after)?;
        let value = flattened.settled();

        let previous = self.balance.compare_and_swap(&current, Arc::new(flattened));
        if !Arc::ptr_eq(&*previous, &current) {
            trace!(account = %self.id, "balance changed during compaction");
        }
        Ok(value)
    }
}

impl AdjustBalance for Account {
    fn account_id(&self) -> &str {
        &self.id
    }

    /// Withdrawals are checked against the currently visible value only;
    /// pending withdrawals elsewhere in the log are not counted. An append
    /// that would leave the exposure unrepresentable is refused.
    fn adjust_balance(
        &self,
        delta: Amount,
        marker: &Arc<BalanceLogState>,
    ) -> Result<bool, AdjustmentError> {
        let current = self.balance.load_full();
        current.exposure()?.checked_add(delta.abs())?;
        if delta.is_negative() {
            let available = current.value()?;
            if delta.abs() > available {
                return Err(AdjustmentError::InsufficientBalance {
                    account: self.id.clone(),
                    available,
                    requested: delta.abs(),
                });
            }
        }

        let entry = BalanceLogEntry::new(delta, marker.clone(), self.clock.now());
        let previous = self
            .balance
            .compare_and_swap(&current, Arc::new(current.add_log_entry(entry)));
        Ok(Arc::ptr_eq(&*previous, &current))
    }
}
