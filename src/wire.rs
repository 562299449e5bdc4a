//! Delivery of registry notifications.
//!
//! The registry hands every [ChannelEvent] to an [EventBus]. Applications
//! either consume the typed events directly or wrap a [BytesBus] in the
//! [ProtoBufEncodingLayer] to get protobuf-encoded frames.

mod encoding;
mod messages;


use core::fmt::Debug;

pub use encoding::{EncodingError, ProtoBufEncodingLayer};
pub use messages::{
    channel_event_msg, ChallengeStartedMsg, ChannelEventMsg, ChannelInfoMsg, ConversionError,
    CreatedMsg, RechargedMsg, SettledMsg, SettlementKindMsg, WithdrawnMsg,
};

use crate::registry::ChannelEvent;

/// Receives the typed notifications of a registry.
pub trait EventBus: Debug {
    fn emit(&self, event: ChannelEvent);
}

/// Low-level sink for encoded notifications.
pub trait BytesBus: Debug {
    fn send(&self, frame: &[u8]);
}

/// Bus that drops every event, for deployments nobody listens to.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBus;

impl EventBus for NullBus {
    fn emit(&self, _event: ChannelEvent) {}
}

impl<B: EventBus> EventBus for &B {
    fn emit(&self, event: ChannelEvent) {
        (**self).emit(event)
    }
}
