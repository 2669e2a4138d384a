//! Replays an instruction stream through both account designs side by side.
//!
//! Every instruction is applied to the snapshot ledger and to the logged
//! accounts in turn. A failure in one design does not stop the other, and no
//! failure stops the replay.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_stream::{Stream, StreamExt};
use tracing::info;

use crate::amount::AmountOverflow;
use crate::clock::{Clock, SystemClock};
use crate::logged::{self, TransferError};
use crate::model::{AccountId, Instruction};
use crate::snapshot::{self, Ledger, LedgerError};
use crate::{Amount, Config};

/// Which account design a result or balance belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Design {
    Logged,
    Snapshot,
}

impl fmt::Display for Design {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Design::Logged => f.write_str("logged"),
            Design::Snapshot => f.write_str("snapshot"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("snapshot ledger: {0}")]
    Snapshot(#[from] LedgerError),

    #[error("logged accounts: {0}")]
    Logged(#[from] TransferError),

    #[error("{op} gave up after {retries} snapshot retries")]
    Contention { op: &'static str, retries: usize },

    #[error("account {0} does not exist")]
    UnknownAccount(AccountId),

    #[error("account {0} already exists")]
    DuplicateAccount(AccountId),
}

/// Final balance of one account in one design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRow {
    pub design: Design,
    pub account: AccountId,
    pub balance: Amount,
}

pub struct Replay {
    ledger: Arc<Ledger>,
    snapshot_accounts: snapshot::AccountService,
    snapshot_transfers: snapshot::TransferService,
    logged_accounts: HashMap<AccountId, logged::Account>,
    logged_transfers: logged::TransferService,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
}

/// Public API
impl Replay {
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Self {
        let ledger = Arc::new(Ledger::new(config.retry_count));
        Self {
            snapshot_accounts: snapshot::AccountService::new(ledger.clone()),
            snapshot_transfers: snapshot::TransferService::new(ledger.clone()),
            ledger,
            logged_accounts: HashMap::new(),
            logged_transfers: logged::TransferService::new(config.retry_count),
            clock,
            stale_after: config.stale_after,
        }
    }

    /// Apply every instruction from `stream`, logging and skipping failures.
    pub async fn run(&mut self, mut stream: impl Stream<Item = Instruction> + Unpin) {
        while let Some(instruction) = stream.next().await {
            let _ = self.apply(instruction);
        }
    }

    /// Apply one instruction to both designs.
    ///
    /// Both designs are always attempted; the first failure is returned.
    pub fn apply(&mut self, instruction: Instruction) -> Result<(), ReplayError> {
        let snapshot = self.apply_snapshot(&instruction);
        Self::log_result(Design::Snapshot, &instruction, &snapshot);

        let logged = self.apply_logged(&instruction);
        Self::log_result(Design::Logged, &instruction, &logged);

        snapshot?;
        logged
    }

    /// Balances of every account in both designs, sorted by design then id.
    ///
    /// Reading logged balances compacts their logs.
    pub fn balances(&self) -> Result<Vec<BalanceRow>, AmountOverflow> {
        let snapshot = self.ledger.snapshot();
        let mut rows: Vec<BalanceRow> = snapshot
            .iter()
            .map(|account| {
                Ok(BalanceRow {
                    design: Design::Snapshot,
                    account: account.id().to_string(),
                    balance: account.balance(),
                })
            })
            .chain(self.logged_accounts.values().map(|account| {
                Ok(BalanceRow {
                    design: Design::Logged,
                    account: account.id().to_string(),
                    balance: account.get_balance()?,
                })
            }))
            .collect::<Result<_, AmountOverflow>>()?;
        rows.sort_by(|a, b| (a.design, &a.account).cmp(&(b.design, &b.account)));
        Ok(rows)
    }

    pub fn snapshot_balance(&self, account: &str) -> Option<Amount> {
        self.snapshot_accounts
            .get_account(account)
            .map(|account| account.balance())
    }

    pub fn logged_balance(&self, account: &str) -> Result<Option<Amount>, AmountOverflow> {
        self.logged_accounts
            .get(account)
            .map(logged::Account::get_balance)
            .transpose()
    }
}

/// Private API
impl Replay {
    fn log_result(design: Design, instruction: &Instruction, result: &Result<(), ReplayError>) {
        let op = instruction.kind();
        match result {
            Ok(()) => info!(%design, ?instruction, "{op} applied"),
            Err(e) => info!(%design, ?instruction, reason = %e, "{op} skipped"),
        }
    }

    fn apply_snapshot(&self, instruction: &Instruction) -> Result<(), ReplayError> {
        let installed = match instruction {
            Instruction::Open { account } => self.snapshot_accounts.create_account(account)?,
            Instruction::Deposit { account, amount } => {
                self.snapshot_accounts.deposit(account, *amount)?
            }
            Instruction::Transfer { from, to, amount } => {
                self.snapshot_transfers.transfer_balance(from, to, *amount)?
            }
        };
        if !installed {
            return Err(ReplayError::Contention {
                op: instruction.kind(),
                retries: self.ledger.retry_count(),
            });
        }
        Ok(())
    }

    fn apply_logged(&mut self, instruction: &Instruction) -> Result<(), ReplayError> {
        match instruction {
            Instruction::Open { account } => {
                if self.logged_accounts.contains_key(account) {
                    return Err(ReplayError::DuplicateAccount(account.clone()));
                }
                let opened = logged::Account::with_clock(
                    account.clone(),
                    self.clock.clone(),
                    self.stale_after,
                );
                self.logged_accounts.insert(account.clone(), opened);
            }
            Instruction::Deposit { account, amount } => {
                let account = self.logged_account(account)?;
                self.logged_transfers.deposit(account, *amount)?;
            }
            Instruction::Transfer { from, to, amount } => {
                let source = self.logged_account(from)?;
                let destination = self.logged_account(to)?;
                self.logged_transfers
                    .transfer_balance(source, destination, *amount)?;
            }
        }
        Ok(())
    }

    fn logged_account(&self, id: &str) -> Result<&logged::Account, ReplayError> {
        self.logged_accounts
            .get(id)
            .ok_or_else(|| ReplayError::UnknownAccount(id.to_string()))
    }
}
