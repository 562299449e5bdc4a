use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::{
    abiencode::{
        self,
        types::{Address, Hash, Signature, U256},
    },
    sig::Signer,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error(transparent)]
    AbiEncodeError(#[from] abiencode::Error),
    #[error("failed to sign the digest")]
    SigningFailed,
}

/// The message behind every off-chain authorization.
///
/// Packed-encoded and hashed as
/// `keccak256(counterparty:address || balance:uint256 || channel:address)`,
/// which binds a signature to one channel and one cumulative balance. The
/// counterparty is the party that benefits from the signature: the receiver
/// in a withdrawal proof (signed by the sender) and the sender in a closing
/// proof (signed by the receiver).
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct BalanceProof {
    pub counterparty: Address,
    pub balance: U256,
    pub channel: Address,
}

impl BalanceProof {
    /// Sender-side proof, authorizing `receiver` to withdraw up to `balance`.
    pub fn withdrawal(receiver: Address, balance: U256, channel: Address) -> Self {
        Self {
            counterparty: receiver,
            balance,
            channel,
        }
    }

    /// Receiver-side proof, agreeing to close the channel at `balance`.
    pub fn closing(sender: Address, balance: U256, channel: Address) -> Self {
        Self {
            counterparty: sender,
            balance,
            channel,
        }
    }

    pub fn digest(&self) -> Result<Hash, abiencode::Error> {
        let digest = abiencode::to_hash(self)?;
        trace!(
            counterparty = %self.counterparty,
            balance = %self.balance,
            channel = %self.channel,
            %digest,
            "balance proof digest"
        );
        Ok(digest)
    }

    pub fn sign(&self, signer: &Signer) -> Result<Signature, SignError> {
        let digest = self.digest()?;
        signer
            .sign_eth(digest)
            .map_err(|_| SignError::SigningFailed)
    }
}
