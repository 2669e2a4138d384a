//! Core domain types shared by both account designs.

use crate::Amount;

/// Account identifier.
pub type AccountId = String;

/// An instruction replayed against both account designs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Open a zero-balance account.
    Open { account: AccountId },
    /// Credit funds to a single account.
    Deposit { account: AccountId, amount: Amount },
    /// Move funds between two accounts.
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
}

impl Instruction {
    /// Short lowercase name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Instruction::Open { .. } => "open",
            Instruction::Deposit { .. } => "deposit",
            Instruction::Transfer { .. } => "transfer",
        }
    }
}
