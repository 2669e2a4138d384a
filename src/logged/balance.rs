use std::time::Duration;

use tracing::warn;

use super::{BalanceLogEntry, BalanceLogStatus};
use crate::Amount;
use crate::amount::AmountOverflow;
use crate::clock::Timestamp;

/// A settled value plus the adjustments proposed since it was settled.
///
/// The effective value counts the settled amount and every entry whose marker
/// has completed. Pending and aborted entries contribute nothing.
#[derive(Debug, Clone, Default)]
pub struct Balance {
    settled: Amount,
    log: Vec<BalanceLogEntry>,
}

impl Balance {
    pub fn new(settled: Amount) -> Self {
        Self {
            settled,
            log: Vec::new(),
        }
    }

    pub fn with_log(settled: Amount, log: Vec<BalanceLogEntry>) -> Self {
        Self { settled, log }
    }

    pub fn settled(&self) -> Amount {
        self.settled
    }

    pub fn log(&self) -> &[BalanceLogEntry] {
        &self.log
    }

    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    /// Settled value plus completed deltas.
    pub fn value(&self) -> Result<Amount, AmountOverflow> {
        let completed = self
            .log
            .iter()
            .filter(|entry| entry.status() == BalanceLogStatus::Complete)
            .map(BalanceLogEntry::delta);
        Amount::checked_sum(std::iter::once(self.settled).chain(completed))
    }

    /// Magnitude of the settled value plus every entry not yet aborted.
    ///
    /// Any value this balance can later fold to is bounded by it, so while it
    /// is representable no fold of this log can overflow.
    pub fn exposure(&self) -> Result<Amount, AmountOverflow> {
        let live = self
            .log
            .iter()
            .filter(|entry| entry.status() != BalanceLogStatus::Aborted)
            .map(|entry| entry.delta().abs());
        Amount::checked_sum(std::iter::once(self.settled.abs()).chain(live))
    }

    pub fn pending_entries(&self) -> Vec<BalanceLogEntry> {
        self.log
            .iter()
            .filter(|entry| entry.status() == BalanceLogStatus::Pending)
            .cloned()
            .collect()
    }

    /// Copy of this balance with `entry` appended.
    pub fn add_log_entry(&self, entry: BalanceLogEntry) -> Balance {
        let mut log = Vec::with_capacity(self.log.len() + 1);
        log.extend(self.log.iter().cloned());
        log.push(entry);
        Balance {
            settled: self.settled,
            log,
        }
    }

    /// Fold completed entries into the settled value and drop resolved ones.
    ///
    /// Pending entries older than `stale_after` (as of `now`) are forced to
    /// aborted and dropped. If another thread resolves such a marker first,
    /// its outcome is honoured instead. Younger pending entries are kept.
    pub fn flatten_log(
        &self,
        now: Timestamp,
        stale_after: Duration,
    ) -> Result<Balance, AmountOverflow> {
        let stale_after = stale_after.as_millis() as u64;
        let mut settled = self.settled;
        let mut log = Vec::new();

        for entry in &self.log {
            let mut status = entry.status();
            if status == BalanceLogStatus::Pending
                && now.saturating_sub(entry.created_at()) > stale_after
            {
                if entry.state().abort() {
                    warn!(
                        delta = %entry.delta(),
                        created_at = entry.created_at(),
                        now,
                        "aborted stale pending log entry"
                    );
                }
                status = entry.status();
            }

            match status {
                BalanceLogStatus::Complete => settled = settled.checked_add(entry.delta())?,
                BalanceLogStatus::Pending => log.push(entry.clone()),
                BalanceLogStatus::Aborted => {}
            }
        }

        Ok(Balance { settled, log })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logged::BalanceLogState;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    const NOW: Timestamp = 1_000_000;
    const STALE: Duration = Duration::from_millis(500);

    fn amount(value: rust_decimal::Decimal) -> Amount {
        Amount::from(value)
    }

    fn entry(delta: Amount, created_at: Timestamp) -> (BalanceLogEntry, Arc<BalanceLogState>) {
        let state = Arc::new(BalanceLogState::new());
        (BalanceLogEntry::new(delta, state.clone(), created_at), state)
    }

    #[test]
    fn starts_with_submitted_value() {
        assert_eq!(Balance::new(Amount::ZERO).value().unwrap(), Amount::ZERO);
        assert_eq!(Balance::new(amount(dec!(10))).value().unwrap(), amount(dec!(10)));
        assert_eq!(Balance::new(amount(dec!(-10))).value().unwrap(), amount(dec!(-10)));
    }

    #[test]
    fn starts_with_empty_log() {
        assert_eq!(Balance::new(amount(dec!(10))).log_len(), 0);
    }

    #[test]
    fn starts_with_populated_log() {
        let (e, _) = entry(amount(dec!(1)), NOW);
        let balance = Balance::with_log(amount(dec!(10)), vec![e]);
        assert_eq!(balance.log_len(), 1);
    }

    #[test]
    fn ignores_pending_entry() {
        let (e, _) = entry(amount(dec!(1)), NOW);
        let balance = Balance::with_log(amount(dec!(10)), vec![e]);
        assert_eq!(balance.value().unwrap(), amount(dec!(10)));
    }

    #[test]
    fn ignores_aborted_entry() {
        let (e, state) = entry(amount(dec!(1)), NOW);
        let balance = Balance::with_log(amount(dec!(10)), vec![e]);
        state.abort();
        assert_eq!(balance.value().unwrap(), amount(dec!(10)));
    }

    #[test]
    fn includes_completed_entry() {
        let (e, state) = entry(amount(dec!(1)), NOW);
        let balance = Balance::with_log(amount(dec!(10)), vec![e]);
        state.complete();
        assert_eq!(balance.log_len(), 1);
        assert_eq!(balance.value().unwrap(), amount(dec!(11)));
    }

    #[test]
    fn pending_entries_track_marker() {
        let (e, state) = entry(amount(dec!(1)), NOW);
        let balance = Balance::new(amount(dec!(10))).add_log_entry(e.clone());

        let pending = balance.pending_entries();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].is_same(&e));

        state.complete();
        assert!(balance.pending_entries().is_empty());
    }

    #[test]
    fn pending_entries_skip_aborted() {
        let (e, state) = entry(amount(dec!(1)), NOW);
        let balance = Balance::new(amount(dec!(10))).add_log_entry(e);
        state.abort();
        assert!(balance.pending_entries().is_empty());
    }

    #[test]
    fn add_log_entry_leaves_source_unchanged() {
        let (e, _) = entry(amount(dec!(1)), NOW);
        let balance = Balance::new(amount(dec!(10)));
        let appended = balance.add_log_entry(e);
        assert_eq!(balance.log_len(), 0);
        assert_eq!(appended.log_len(), 1);
        assert_eq!(appended.settled(), amount(dec!(10)));
    }

    #[test]
    fn flattened_balance_folds_completed() {
        let (e, state) = entry(amount(dec!(1)), NOW);
        let balance = Balance::new(amount(dec!(10))).add_log_entry(e);
        state.complete();

        let flat = balance.flatten_log(NOW, STALE).unwrap();
        assert_eq!(flat.settled(), amount(dec!(11)));
        assert_eq!(flat.value().unwrap(), amount(dec!(11)));
        assert_eq!(flat.log_len(), 0);
    }

    #[test]
    fn flatten_drops_aborted() {
        let (e, state) = entry(amount(dec!(-4)), NOW);
        let balance = Balance::new(amount(dec!(10))).add_log_entry(e);
        state.abort();

        let flat = balance.flatten_log(NOW, STALE).unwrap();
        assert_eq!(flat.settled(), amount(dec!(10)));
        assert_eq!(flat.log_len(), 0);
    }

    #[test]
    fn keeps_recent_pending_entry() {
        let (e, state) = entry(amount(dec!(1)), NOW);
        let balance = Balance::new(amount(dec!(10))).add_log_entry(e);

        let flat = balance.flatten_log(NOW, STALE).unwrap();
        assert_eq!(flat.log_len(), 1);
        assert_eq!(state.status(), BalanceLogStatus::Pending);
    }

    #[test]
    fn entry_at_threshold_is_not_stale() {
        let (e, state) = entry(amount(dec!(1)), NOW - 500);
        let balance = Balance::new(amount(dec!(10))).add_log_entry(e);

        let flat = balance.flatten_log(NOW, STALE).unwrap();
        assert_eq!(flat.log_len(), 1);
        assert_eq!(state.status(), BalanceLogStatus::Pending);
    }

    #[test]
    fn aborts_and_removes_stale_pending_entry() {
        let (e, state) = entry(amount(dec!(1)), NOW - 1_000);
        let balance = Balance::new(amount(dec!(10))).add_log_entry(e);
        assert_eq!(balance.log_len(), 1);

        let flat = balance.flatten_log(NOW, STALE).unwrap();
        assert_eq!(flat.log_len(), 0);
        assert_eq!(flat.settled(), amount(dec!(10)));
        assert_eq!(state.status(), BalanceLogStatus::Aborted);
    }

    #[test]
    fn stale_but_completed_entry_is_folded() {
        let (e, state) = entry(amount(dec!(2)), NOW - 1_000);
        let balance = Balance::new(amount(dec!(10))).add_log_entry(e);
        state.complete();

        let flat = balance.flatten_log(NOW, STALE).unwrap();
        assert_eq!(flat.settled(), amount(dec!(12)));
        assert_eq!(flat.log_len(), 0);
        assert_eq!(state.status(), BalanceLogStatus::Complete);
    }

    #[test]
    fn flatten_keeps_entry_order() {
        let (first, _) = entry(amount(dec!(1)), NOW);
        let (done, done_state) = entry(amount(dec!(5)), NOW);
        let (second, _) = entry(amount(dec!(2)), NOW);
        let balance = Balance::new(Amount::ZERO)
            .add_log_entry(first.clone())
            .add_log_entry(done)
            .add_log_entry(second.clone());
        done_state.complete();

        let flat = balance.flatten_log(NOW, STALE).unwrap();
        assert_eq!(flat.settled(), amount(dec!(5)));
        assert_eq!(flat.log_len(), 2);
        assert!(flat.log()[0].is_same(&first));
        assert!(flat.log()[1].is_same(&second));
    }

    #[test]
    fn exposure_counts_magnitudes_of_live_entries() {
        let (withdrawal, _) = entry(amount(dec!(-4)), NOW);
        let (deposit, deposit_state) = entry(amount(dec!(3)), NOW);
        let (dropped, dropped_state) = entry(amount(dec!(100)), NOW);
        let balance = Balance::new(amount(dec!(-10)))
            .add_log_entry(withdrawal)
            .add_log_entry(deposit)
            .add_log_entry(dropped);
        deposit_state.complete();
        dropped_state.abort();

        assert_eq!(balance.exposure(), Ok(amount(dec!(17))));
        assert_eq!(balance.value(), Ok(amount(dec!(-7))));
    }

    #[test]
    fn value_refuses_to_round() {
        let (e, state) = entry(amount(dec!(0.1)), NOW);
        let balance = Balance::new(amount(dec!(10000000000000000000000000000))).add_log_entry(e);
        state.complete();

        assert!(balance.value().is_err());
        assert!(balance.flatten_log(NOW, STALE).is_err());
    }
}
