//! The host environment the registry executes in.
//!
//! On chain this is the EVM: it orders every call, provides the block
//! timestamp, knows which addresses hold code and routes calls to token
//! contracts. The registry only needs those four capabilities, captured by
//! [Ledger].

use alloc::collections::BTreeMap;

use crate::{
    abiencode::types::Address,
    token::{MemoryToken, Token},
};

pub trait Ledger {
    /// Tokens must be cloneable so a failed call can be rolled back to the
    /// snapshot taken before it.
    ///
    /// The registry clones the whole token once per channel operation, so
    /// the clone should be cheap. [MemoryToken] copies every balance and
    /// allowance, which is linear in the number of holders. A host with a
    /// large token state should use a handle type here, e.g. an `Rc` to a
    /// copy-on-write store or a journal that records only the touched
    /// accounts.
    type Token: Token + Clone;

    /// Current time in seconds, used for the challenge timer.
    fn timestamp(&self) -> u64;

    /// Whether code is deployed at `address`.
    fn is_contract(&self, address: Address) -> bool;

    fn token(&self, address: Address) -> Option<&Self::Token>;

    fn token_mut(&mut self, address: Address) -> Option<&mut Self::Token>;
}

/// Ledger keeping every token in memory, with a manually advanced clock.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    timestamp: u64,
    tokens: BTreeMap<Address, MemoryToken>,
}

impl MemoryLedger {
    pub fn new(timestamp: u64) -> Self {
        Self {
            timestamp,
            tokens: BTreeMap::new(),
        }
    }

    /// Deploy a fresh token at `address`, replacing any previous one.
    pub fn deploy_token(&mut self, address: Address) -> &mut MemoryToken {
        let token = self.tokens.entry(address).or_default();
        *token = MemoryToken::new(address);
        token
    }

    pub fn advance(&mut self, seconds: u64) {
        self.timestamp = self.timestamp.saturating_add(seconds);
    }
}

impl Ledger for MemoryLedger {
    type Token = MemoryToken;

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn is_contract(&self, address: Address) -> bool {
        self.tokens.contains_key(&address)
    }

    fn token(&self, address: Address) -> Option<&MemoryToken> {
        self.tokens.get(&address)
    }

    fn token_mut(&mut self, address: Address) -> Option<&mut MemoryToken> {
        self.tokens.get_mut(&address)
    }
}
