//! The unidirectional token channel: state machine, deposit accounting and
//! the challenge record.
//!
//! State transitions (initial `Initiated`, terminal `Settled`):
//! - Initiated → Recharged (recharge)
//! - Recharged → Recharged (recharge)
//! - Recharged/Withdrawn → Withdrawn (withdraw)
//! - Recharged/Withdrawn/InChallenge → Settled (mutual settlement)
//! - Recharged/Withdrawn → InChallenge (challenged settlement)
//! - InChallenge → Settled (after challenge settlement, once the period elapsed)
//!
//! Balances in withdrawals and settlements are cumulative: the amount ever
//! authorized to the receiver, never an increment.

mod escrow;
mod handle;
mod proof;

#[cfg(test)]
mod tests;

use core::fmt::Display;

use crate::abiencode::types::{Address, U256};

pub use escrow::{Channel, OpenParams};
pub use handle::ChannelHandle;
pub use proof::{BalanceProof, SignError};

/// Lifecycle of a channel. The discriminants are the stable status codes
/// reported to external readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Status {
    Initiated = 0,
    Recharged = 1,
    Withdrawn = 2,
    InChallenge = 3,
    Settled = 4,
}

impl Status {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Returned when a status code does not name a [Status].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownStatus(pub u8);

impl TryFrom<u8> for Status {
    type Error = UnknownStatus;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Status::Initiated),
            1 => Ok(Status::Recharged),
            2 => Ok(Status::Withdrawn),
            3 => Ok(Status::InChallenge),
            4 => Ok(Status::Settled),
            other => Err(UnknownStatus(other)),
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Status::Initiated => "initiated",
            Status::Recharged => "recharged",
            Status::Withdrawn => "withdrawn",
            Status::InChallenge => "in challenge",
            Status::Settled => "settled",
        })
    }
}

/// Who is allowed (or required) to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Sender,
    Receiver,
    /// Either the sender or the receiver
    Participant,
}

impl Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Role::Sender => "sender",
            Role::Receiver => "receiver",
            Role::Participant => "participant",
        })
    }
}

/// State-changing channel operations, used to report rejected transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Recharge,
    Withdraw,
    MutualSettlement,
    ChallengedSettlement,
    AfterChallengeSettlement,
}

impl Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Operation::Recharge => "recharge",
            Operation::Withdraw => "withdraw",
            Operation::MutualSettlement => "mutual settlement",
            Operation::ChallengedSettlement => "challenged settlement",
            Operation::AfterChallengeSettlement => "after challenge settlement",
        })
    }
}

/// Unilateral claim of the sender, open while the channel is `InChallenge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge {
    /// Cumulative balance the sender declares as owed to the receiver
    pub balance: U256,
    pub start_time: u64,
    pub period: u64,
}

impl Challenge {
    /// First timestamp at which the challenge may be finalized.
    pub fn ends_at(&self) -> u64 {
        self.start_time.saturating_add(self.period)
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.ends_at()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementKind {
    /// Both parties signed the final balance
    Mutual,
    /// The sender's declared balance after the challenge period
    Challenged,
}

/// Funds disbursed when a channel settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub kind: SettlementKind,
    pub balance: U256,
    pub receiver_payout: U256,
    pub sender_refund: U256,
}

/// Full channel record as reported to readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelInfo {
    pub address: Address,
    pub sender: Address,
    pub receiver: Address,
    pub token: Address,
    pub challenge_period: u64,
    pub start_time: u64,
    pub status: Status,
    pub deposit: U256,
    pub withdrawn: U256,
}
