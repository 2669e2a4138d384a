pub mod amount;
pub mod clock;
pub mod config;
pub mod csv;
pub mod logged;
pub mod model;
pub mod replay;
pub mod snapshot;

pub use amount::{Amount, AmountOverflow};
pub use config::Config;
pub use model::{AccountId, Instruction};
pub use replay::Replay;
