use core::fmt::{Debug, Display};

use serde::Serialize;
use uint::construct_uint;

macro_rules! impl_hex_fmt {
    ($T:ident) => {
        impl Debug for $T {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str("0x")?;
                for b in self.0 {
                    f.write_fmt(format_args!("{:02x}", b))?;
                }
                Ok(())
            }
        }

        impl Display for $T {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                Debug::fmt(self, f)
            }
        }
    };
}

macro_rules! bytesN {
    ( $T:ident, $N:literal ) => {
        #[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone)]
        pub struct $T(pub [u8; $N]);

        impl Serialize for $T {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_bytes(&self.0)
            }
        }

        impl Default for $T {
            fn default() -> Self {
                Self([0; $N])
            }
        }

        impl_hex_fmt!($T);
    };
}

bytesN!(Hash, 32);
bytesN!(Address, 20);

impl Address {
    /// The all-zero address, never a valid participant.
    pub const ZERO: Address = Address([0; 20]);

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Takes the low 20 bytes of a hash, the way the EVM derives addresses
    /// from public keys and contract creation data.
    pub fn from_hash(hash: Hash) -> Self {
        let mut addr = Address::ZERO;
        addr.0.copy_from_slice(&hash.0[32 - 20..]);
        addr
    }
}

/// Ethereum-style recoverable signature: `r || s || v`.
#[derive(PartialEq, Eq, Copy, Clone)]
pub struct Signature(pub [u8; 65]);
impl_hex_fmt!(Signature);

impl Signature {
    pub const LEN: usize = 65;

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0; 65])
    }
}

/// Returned when a byte slice does not have the length of the target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthMismatch {
    pub expected: usize,
    pub actual: usize,
}

impl TryFrom<&[u8]> for Signature {
    type Error = LengthMismatch;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; 65] = value.try_into().or(Err(LengthMismatch {
            expected: Self::LEN,
            actual: value.len(),
        }))?;
        Ok(Signature(bytes))
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = LengthMismatch;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; 20] = value.try_into().or(Err(LengthMismatch {
            expected: 20,
            actual: value.len(),
        }))?;
        Ok(Address(bytes))
    }
}

// Our own U256 instead of primitive_types/ethereum_types: their serde impls
// produce hex strings, while the packed encoder needs the raw 32 big-endian
// bytes.
construct_uint! {
    pub struct U256(4);
}

impl U256 {
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        self.to_big_endian(&mut bytes);
        bytes
    }
}

impl Serialize for U256 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.to_be_bytes())
    }
}
