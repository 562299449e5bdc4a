//! Error type and Return values used by the packed Serialization.

use alloc::string::{String, ToString};

use serde::ser;
use thiserror::Error;

/// Represents all possible errors that can happen during Serialization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The struct contains a type that has no packed Solidity representation.
    ///
    /// For example floating point numbers, options, enums and maps. Enums that
    /// should end up as a number must be converted before encoding.
    #[error("type is not representable in packed encoding: {0}")]
    TypeNotRepresentable(&'static str),
    /// Although the type is representable in Solidity (`char` and arrays,
    /// whose elements are padded to 32 bytes even in packed mode), the
    /// Serializer does not implement it.
    #[error("type is not yet implemented: {0}")]
    TypeNotYetSupported(&'static str),
    /// Raised by a `Serialize` implementation through [ser::Error::custom].
    #[error("{0}")]
    Custom(String),
}

impl ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: core::fmt::Display,
    {
        Error::Custom(msg.to_string())
    }
}

/// Alias for `Result` using the [Error] returned by the Serializer.
pub type Result<T> = core::result::Result<T, Error>;
