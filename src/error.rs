//! Errors returned by channel and registry operations.
//!
//! Every variant describes a call that was rejected as a whole: no channel
//! state changed and no tokens moved.

use thiserror::Error;

use crate::{
    abiencode::{self, types::Address, types::U256},
    channel::{Operation, Role, Status},
    sig::RecoveryError,
    token::TokenError,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // Input validation
    /// A participant or token address is the zero address
    #[error("{0} must not be the zero address")]
    ZeroAddress(Role),

    #[error("sender and receiver must be different identities")]
    SameParticipants,

    #[error("token {0} is not a contract")]
    TokenNotContract(Address),

    #[error("challenge period must be greater than zero")]
    ZeroChallengePeriod,

    #[error("amount must be greater than zero")]
    ZeroAmount,

    // Authorization
    #[error("caller {caller} is not the channel {expected}")]
    Unauthorized { caller: Address, expected: Role },

    /// The signature is well-formed but was produced by someone else
    #[error("signature recovers to {recovered}, expected the {expected} {address}")]
    InvalidSigner {
        expected: Role,
        address: Address,
        recovered: Address,
    },

    #[error("{role} signature: {source}")]
    Signature {
        role: Role,
        #[source]
        source: RecoveryError,
    },

    // State guards
    #[error("{operation} is not allowed while the channel is {status}")]
    InvalidStatus { operation: Operation, status: Status },

    #[error("balance {balance} exceeds deposit {deposit}")]
    BalanceExceedsDeposit { balance: U256, deposit: U256 },

    /// Cumulative balances must strictly increase, anything else is a replay
    #[error("balance {balance} does not exceed the withdrawn amount {withdrawn}")]
    StaleBalance { balance: U256, withdrawn: U256 },

    #[error("declared balance {balance} is below the withdrawn amount {withdrawn}")]
    BalanceBelowWithdrawn { balance: U256, withdrawn: U256 },

    #[error("channel has no deposit")]
    EmptyDeposit,

    #[error("deposit would overflow")]
    DepositOverflow,

    #[error("challenge ends at {ends_at}, current time is {now}")]
    ChallengeNotExpired { ends_at: u64, now: u64 },

    #[error("{0} is not a channel of this registry")]
    UnknownChannel(Address),

    // Collaborators
    #[error("token {0} is not deployed on the ledger")]
    UnknownToken(Address),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("failed to encode message: {0}")]
    Encoding(#[from] abiencode::Error),
}

/// Alias for `Result` using the crate [Error].
pub type Result<T> = core::result::Result<T, Error>;
