use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Resolution of a balance log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BalanceLogStatus {
    Pending = 0,
    Complete = 1,
    Aborted = 2,
}

impl BalanceLogStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => BalanceLogStatus::Pending,
            1 => BalanceLogStatus::Complete,
            _ => BalanceLogStatus::Aborted,
        }
    }
}

impl fmt::Display for BalanceLogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BalanceLogStatus::Pending => "pending",
            BalanceLogStatus::Complete => "complete",
            BalanceLogStatus::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Completion marker shared by every log entry of one transfer attempt.
///
/// Starts pending. Exactly one of [`complete`](Self::complete) and
/// [`abort`](Self::abort) can ever succeed; terminal states never change.
#[derive(Debug)]
pub struct BalanceLogState {
    status: AtomicU8,
}

impl BalanceLogState {
    pub fn new() -> Self {
        Self {
            status: AtomicU8::new(BalanceLogStatus::Pending as u8),
        }
    }

    pub fn status(&self) -> BalanceLogStatus {
        BalanceLogStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// `pending -> complete`. False if already resolved.
    pub fn complete(&self) -> bool {
        self.resolve(BalanceLogStatus::Complete)
    }

    /// `pending -> aborted`. False if already resolved.
    pub fn abort(&self) -> bool {
        self.resolve(BalanceLogStatus::Aborted)
    }

    fn resolve(&self, to: BalanceLogStatus) -> bool {
        self.status
            .compare_exchange(
                BalanceLogStatus::Pending as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl Default for BalanceLogState {
    fn default() -> Self {
        Self::new()
    }
}
