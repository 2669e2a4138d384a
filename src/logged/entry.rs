use std::sync::Arc;

use super::{BalanceLogState, BalanceLogStatus};
use crate::Amount;
use crate::clock::Timestamp;

/// One proposed adjustment, counted only once its marker completes.
#[derive(Debug, Clone)]
pub struct BalanceLogEntry {
    delta: Amount,
    state: Arc<BalanceLogState>,
    created_at: Timestamp,
}

impl BalanceLogEntry {
    pub fn new(delta: Amount, state: Arc<BalanceLogState>, created_at: Timestamp) -> Self {
        Self {
            delta,
            state,
            created_at,
        }
    }

    pub fn delta(&self) -> Amount {
        self.delta
    }

    pub fn state(&self) -> &Arc<BalanceLogState> {
        &self.state
    }

    pub fn status(&self) -> BalanceLogStatus {
        self.state.status()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Same entry: identical delta and timestamp, and the very same marker.
    pub fn is_same(&self, other: &BalanceLogEntry) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
            && self.delta == other.delta
            && self.created_at == other.created_at
    }
}
