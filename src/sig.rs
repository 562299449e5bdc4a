//! Handles the creation and verification of (Ethereum) Signatures.
//!
//! Every authorization the channel accepts is a 65-byte `r || s || v`
//! signature over the Ethereum personal-message hash of a 32-byte digest,
//! which is what wallets produce for `eth_sign`. [recover_signer] is the only
//! verification primitive; callers compare its result with the participant
//! they expect.

use crate::abiencode::types::{Address, Hash, Signature};
use sha3::{Digest, Keccak256};
use thiserror::Error;

mod k256;
pub use self::k256::Signer;


/// Reasons why no signer could be recovered.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("signature must be 65 bytes, got {0}")]
    InvalidLength(usize),
    #[error("invalid recovery id {0}")]
    InvalidRecoveryId(u8),
    #[error("signature does not correspond to any public key")]
    Malformed,
}

/// Add the `\x19Ethereum Signed Message\n<length>` prefix to hash.
///
/// This is the format expected by `ecrecover` based verification on the
/// Solidity side.
fn hash_to_eth_signed_msg_hash(hash: Hash) -> Hash {
    // Packed encoding of a fixed prefix, no need for the serializer.
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n32");
    hasher.update(hash.0);
    Hash(hasher.finalize().into())
}

/// Recover the address that signed `digest`.
///
/// `digest` is the hash of the message itself, it must not include the
/// `Ethereum Signed Message` prefix. The recovery id `v` is accepted both in
/// the EVM form (27/28) and in the raw form (0/1).
pub fn recover_signer(digest: Hash, signature: &[u8]) -> Result<Address, RecoveryError> {
    let sig = Signature::try_from(signature)
        .map_err(|e| RecoveryError::InvalidLength(e.actual))?;

    let mut sig_bytes = sig.0;
    let v = sig_bytes[64];
    sig_bytes[64] = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        _ => return Err(RecoveryError::InvalidRecoveryId(v)),
    };

    let hash = hash_to_eth_signed_msg_hash(digest);
    self::k256::recover(hash, &sig_bytes).map_err(|_| RecoveryError::Malformed)
}
