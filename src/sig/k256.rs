//! Signer using the k256 Rust crate (implementation of ecdsa in Rust).

use crate::abiencode::types::{Address, Hash, Signature};
use k256::{
    ecdsa::{
        recoverable,
        signature::{hazmat::PrehashSigner, Signature as k256Signature},
        SigningKey, VerifyingKey,
    },
    elliptic_curve::sec1::ToEncodedPoint,
};
use sha3::{Digest, Keccak256};

use super::hash_to_eth_signed_msg_hash;

pub use k256::ecdsa::Error;

/// Produces the off-chain authorizations (withdrawal and closing proofs).
///
/// Key management is not the business of this crate; the signer exists so
/// clients and tests can create signatures in exactly the format
/// [recover_signer](super::recover_signer) expects.
pub struct Signer {
    key: SigningKey,
    addr: Address,
}

impl core::fmt::Debug for Signer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Never print the key.
        f.debug_struct("Signer").field("addr", &self.addr).finish()
    }
}

impl From<VerifyingKey> for Address {
    fn from(key: VerifyingKey) -> Self {
        // The uncompressed SEC1 point is `0x04 || x || y`. Throw away the
        // first byte, which is not part of the public key.
        let point = key.to_encoded_point(false);
        let hash: [u8; 32] = Keccak256::digest(&point.as_bytes()[1..]).into();
        Address::from_hash(Hash(hash))
    }
}

impl Signer {
    pub fn new<R: rand::RngCore + rand::CryptoRng>(rng: &mut R) -> Self {
        Self::from_key(SigningKey::random(rng))
    }

    /// Load a signer from a 32-byte big-endian private key.
    pub fn from_bytes(private_key: &[u8; 32]) -> Result<Self, Error> {
        Ok(Self::from_key(SigningKey::from_bytes(private_key)?))
    }

    fn from_key(key: SigningKey) -> Self {
        let addr = key.verifying_key().into();
        Self { key, addr }
    }

    pub fn address(&self) -> Address {
        self.addr
    }

    /// Sign `msg` in the `"\x19Ethereum Signed Message:\n32"` format.
    pub fn sign_eth(&self, msg: Hash) -> Result<Signature, Error> {
        let hash = hash_to_eth_signed_msg_hash(msg);

        let sig: recoverable::Signature = self.key.sign_prehash(&hash.0)?;

        // This Signature type already has the layout we need (r, s and v in
        // this order), but v has to be offset by 27 for the EVM.
        let mut sig_bytes = [0u8; 65];
        sig_bytes.copy_from_slice(sig.as_bytes());
        sig_bytes[64] += 27;

        Ok(Signature(sig_bytes))
    }
}

/// Recover the address from an already prefixed hash and a signature whose
/// recovery id is 0 or 1.
pub(super) fn recover(hash: Hash, sig_bytes: &[u8; 65]) -> Result<Address, Error> {
    let sig = recoverable::Signature::from_bytes(sig_bytes)?;
    let verifying_key = sig.recover_verifying_key_from_digest_bytes(&hash.0.into())?;
    Ok(verifying_key.into())
}
