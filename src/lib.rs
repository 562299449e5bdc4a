//! Unidirectional token payment channels.
//!
//! A sender escrows tokens in a [Channel] and pays a receiver off-chain by
//! signing ever-increasing cumulative balances. The receiver withdraws with
//! the latest proof, both parties can close the channel together, and an
//! unresponsive receiver is handled by a time-locked challenge. Channels are
//! created and driven through a [Registry].

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod abiencode {
    mod error;
    mod hashing;
    mod ser;

    pub mod types;

    pub use error::Error;
    pub use hashing::to_hash;
    pub use ser::{to_writer, Writer};

    #[cfg(test)]
    use ser::to_vec;

    #[cfg(test)]
    mod tests;
}
pub mod sig;

pub mod channel;
pub mod error;
pub mod ledger;
pub mod registry;
pub mod token;
pub mod wire;

pub use abiencode::types::{Address, Hash, Signature, U256};
pub use channel::Channel;
pub use error::{Error, Result};
pub use registry::Registry;
