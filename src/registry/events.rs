use crate::{
    abiencode::types::{Address, U256},
    channel::{Challenge, Settlement},
};

/// Notifications emitted by the registry after a state change was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    Created {
        channel: Address,
        sender: Address,
        receiver: Address,
        token: Address,
        challenge_period: u64,
    },
    Recharged {
        channel: Address,
        amount: U256,
        deposit: U256,
    },
    Withdrawn {
        channel: Address,
        balance: U256,
        payout: U256,
    },
    ChallengeStarted {
        channel: Address,
        challenge: Challenge,
    },
    Settled {
        channel: Address,
        settlement: Settlement,
    },
}

impl ChannelEvent {
    pub fn channel(&self) -> Address {
        match self {
            ChannelEvent::Created { channel, .. }
            | ChannelEvent::Recharged { channel, .. }
            | ChannelEvent::Withdrawn { channel, .. }
            | ChannelEvent::ChallengeStarted { channel, .. }
            | ChannelEvent::Settled { channel, .. } => *channel,
        }
    }
}
