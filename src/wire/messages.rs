//! Protobuf representation of registry notifications and channel records.
//!
//! Addresses are 20 raw bytes, amounts are 32 big-endian bytes.

use alloc::vec::Vec;

use crate::{
    abiencode::types::{Address, U256},
    channel::{Challenge, ChannelInfo, Settlement, SettlementKind, Status},
    registry::ChannelEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("required field is missing")]
    ExptectedSome,
    #[error("field has the wrong byte length")]
    ByteLengthMissmatch,
    #[error("unknown channel status {0}")]
    UnknownStatus(u32),
    #[error("unknown settlement kind {0}")]
    UnknownSettlementKind(i32),
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChannelEventMsg {
    #[prost(oneof = "channel_event_msg::Event", tags = "1, 2, 3, 4, 5")]
    pub event: Option<channel_event_msg::Event>,
}

pub mod channel_event_msg {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Event {
        #[prost(message, tag = "1")]
        Created(super::CreatedMsg),
        #[prost(message, tag = "2")]
        Recharged(super::RechargedMsg),
        #[prost(message, tag = "3")]
        Withdrawn(super::WithdrawnMsg),
        #[prost(message, tag = "4")]
        ChallengeStarted(super::ChallengeStartedMsg),
        #[prost(message, tag = "5")]
        Settled(super::SettledMsg),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreatedMsg {
    #[prost(bytes = "vec", tag = "1")]
    pub channel: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub sender: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub receiver: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub token: Vec<u8>,
    #[prost(uint64, tag = "5")]
    pub challenge_period: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RechargedMsg {
    #[prost(bytes = "vec", tag = "1")]
    pub channel: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub amount: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub deposit: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WithdrawnMsg {
    #[prost(bytes = "vec", tag = "1")]
    pub channel: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub balance: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub payout: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChallengeStartedMsg {
    #[prost(bytes = "vec", tag = "1")]
    pub channel: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub balance: Vec<u8>,
    #[prost(uint64, tag = "3")]
    pub start_time: u64,
    #[prost(uint64, tag = "4")]
    pub period: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum SettlementKindMsg {
    Mutual = 0,
    Challenged = 1,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SettledMsg {
    #[prost(bytes = "vec", tag = "1")]
    pub channel: Vec<u8>,
    #[prost(enumeration = "SettlementKindMsg", tag = "2")]
    pub kind: i32,
    #[prost(bytes = "vec", tag = "3")]
    pub balance: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub receiver_payout: Vec<u8>,
    #[prost(bytes = "vec", tag = "5")]
    pub sender_refund: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChannelInfoMsg {
    #[prost(bytes = "vec", tag = "1")]
    pub address: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub sender: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub receiver: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub token: Vec<u8>,
    #[prost(uint64, tag = "5")]
    pub challenge_period: u64,
    #[prost(uint64, tag = "6")]
    pub start_time: u64,
    #[prost(uint32, tag = "7")]
    pub status: u32,
    #[prost(bytes = "vec", tag = "8")]
    pub deposit: Vec<u8>,
    #[prost(bytes = "vec", tag = "9")]
    pub withdrawn: Vec<u8>,
}

fn address(bytes: &[u8]) -> Result<Address, ConversionError> {
    Address::try_from(bytes).or(Err(ConversionError::ByteLengthMissmatch))
}

fn amount(bytes: &[u8]) -> Result<U256, ConversionError> {
    if bytes.len() != 32 {
        return Err(ConversionError::ByteLengthMissmatch);
    }
    Ok(U256::from_big_endian(bytes))
}

fn amount_bytes(value: U256) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

impl From<SettlementKind> for SettlementKindMsg {
    fn from(value: SettlementKind) -> Self {
        match value {
            SettlementKind::Mutual => Self::Mutual,
            SettlementKind::Challenged => Self::Challenged,
        }
    }
}

impl From<SettlementKindMsg> for SettlementKind {
    fn from(value: SettlementKindMsg) -> Self {
        match value {
            SettlementKindMsg::Mutual => Self::Mutual,
            SettlementKindMsg::Challenged => Self::Challenged,
        }
    }
}

impl From<ChannelEvent> for ChannelEventMsg {
    fn from(value: ChannelEvent) -> Self {
        use channel_event_msg::Event;

        let event = match value {
            ChannelEvent::Created {
                channel,
                sender,
                receiver,
                token,
                challenge_period,
            } => Event::Created(CreatedMsg {
                channel: channel.0.to_vec(),
                sender: sender.0.to_vec(),
                receiver: receiver.0.to_vec(),
                token: token.0.to_vec(),
                challenge_period,
            }),
            ChannelEvent::Recharged {
                channel,
                amount,
                deposit,
            } => Event::Recharged(RechargedMsg {
                channel: channel.0.to_vec(),
                amount: amount_bytes(amount),
                deposit: amount_bytes(deposit),
            }),
            ChannelEvent::Withdrawn {
                channel,
                balance,
                payout,
            } => Event::Withdrawn(WithdrawnMsg {
                channel: channel.0.to_vec(),
                balance: amount_bytes(balance),
                payout: amount_bytes(payout),
            }),
            ChannelEvent::ChallengeStarted { channel, challenge } => {
                Event::ChallengeStarted(ChallengeStartedMsg {
                    channel: channel.0.to_vec(),
                    balance: amount_bytes(challenge.balance),
                    start_time: challenge.start_time,
                    period: challenge.period,
                })
            }
            ChannelEvent::Settled {
                channel,
                settlement,
            } => Event::Settled(SettledMsg {
                channel: channel.0.to_vec(),
                kind: SettlementKindMsg::from(settlement.kind) as i32,
                balance: amount_bytes(settlement.balance),
                receiver_payout: amount_bytes(settlement.receiver_payout),
                sender_refund: amount_bytes(settlement.sender_refund),
            }),
        };
        Self { event: Some(event) }
    }
}

impl TryFrom<ChannelEventMsg> for ChannelEvent {
    type Error = ConversionError;

    fn try_from(value: ChannelEventMsg) -> Result<Self, Self::Error> {
        use channel_event_msg::Event;

        Ok(match value.event.ok_or(ConversionError::ExptectedSome)? {
            Event::Created(msg) => ChannelEvent::Created {
                channel: address(&msg.channel)?,
                sender: address(&msg.sender)?,
                receiver: address(&msg.receiver)?,
                token: address(&msg.token)?,
                challenge_period: msg.challenge_period,
            },
            Event::Recharged(msg) => ChannelEvent::Recharged {
                channel: address(&msg.channel)?,
                amount: amount(&msg.amount)?,
                deposit: amount(&msg.deposit)?,
            },
            Event::Withdrawn(msg) => ChannelEvent::Withdrawn {
                channel: address(&msg.channel)?,
                balance: amount(&msg.balance)?,
                payout: amount(&msg.payout)?,
            },
            Event::ChallengeStarted(msg) => ChannelEvent::ChallengeStarted {
                channel: address(&msg.channel)?,
                challenge: Challenge {
                    balance: amount(&msg.balance)?,
                    start_time: msg.start_time,
                    period: msg.period,
                },
            },
            Event::Settled(msg) => ChannelEvent::Settled {
                channel: address(&msg.channel)?,
                settlement: Settlement {
                    kind: SettlementKindMsg::from_i32(msg.kind)
                        .ok_or(ConversionError::UnknownSettlementKind(msg.kind))?
                        .into(),
                    balance: amount(&msg.balance)?,
                    receiver_payout: amount(&msg.receiver_payout)?,
                    sender_refund: amount(&msg.sender_refund)?,
                },
            },
        })
    }
}

impl From<ChannelInfo> for ChannelInfoMsg {
    fn from(value: ChannelInfo) -> Self {
        Self {
            address: value.address.0.to_vec(),
            sender: value.sender.0.to_vec(),
            receiver: value.receiver.0.to_vec(),
            token: value.token.0.to_vec(),
            challenge_period: value.challenge_period,
            start_time: value.start_time,
            status: value.status.code().into(),
            deposit: amount_bytes(value.deposit),
            withdrawn: amount_bytes(value.withdrawn),
        }
    }
}

impl TryFrom<ChannelInfoMsg> for ChannelInfo {
    type Error = ConversionError;

    fn try_from(value: ChannelInfoMsg) -> Result<Self, Self::Error> {
        let status = u8::try_from(value.status)
            .ok()
            .and_then(|code| Status::try_from(code).ok())
            .ok_or(ConversionError::UnknownStatus(value.status))?;

        Ok(Self {
            address: address(&value.address)?,
            sender: address(&value.sender)?,
            receiver: address(&value.receiver)?,
            token: address(&value.token)?,
            challenge_period: value.challenge_period,
            start_time: value.start_time,
            status,
            deposit: amount(&value.deposit)?,
            withdrawn: amount(&value.withdrawn)?,
        })
    }
}
