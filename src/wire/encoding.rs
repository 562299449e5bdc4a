use prost::bytes::BufMut;
use tracing::error;

use super::{BytesBus, ChannelEventMsg, EventBus};
use crate::registry::ChannelEvent;
use alloc::vec::Vec;

/// Frame could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// Messages longer than `u16::MAX` cannot be length-prefixed
    #[error("message of {0} bytes does not fit a u16 length prefix")]
    TooLong(usize),
    // `prost::EncodeError` only implements `Error` with `std`, so it is not a
    // `#[source]` here.
    #[error("protobuf encoding failed: {0}")]
    Prost(prost::EncodeError),
}

impl From<prost::EncodeError> for EncodingError {
    fn from(e: prost::EncodeError) -> Self {
        Self::Prost(e)
    }
}

/// Encodes every event as a [ChannelEventMsg] and forwards the frame to the
/// wrapped [BytesBus].
#[derive(Debug)]
pub struct ProtoBufEncodingLayer<B: BytesBus> {
    pub bus: B,
}

impl<B: BytesBus> ProtoBufEncodingLayer<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Frame layout: `len:u16 (big-endian) || protobuf message`.
    ///
    /// A fixed 2-byte length is used instead of `encode_length_delimited`,
    /// which would write a LEB128 varint.
    pub fn encode<T: prost::Message>(msg: T) -> Result<Vec<u8>, EncodingError> {
        let len = msg.encoded_len();
        let prefix = u16::try_from(len).map_err(|_| EncodingError::TooLong(len))?;

        let mut buf = Vec::with_capacity(2 + len);
        buf.put_slice(&prefix.to_be_bytes());
        msg.encode(&mut buf)?;
        Ok(buf)
    }
}

impl<B: BytesBus> EventBus for ProtoBufEncodingLayer<B> {
    fn emit(&self, event: ChannelEvent) {
        match Self::encode(ChannelEventMsg::from(event)) {
            Ok(buf) => self.bus.send(&buf),
            // Notifications are best effort, the state change already
            // happened.
            Err(e) => error!(?e, "dropping event that cannot be encoded"),
        }
    }
}
