use crate::abiencode::types::Address;

/// Which identity the sender's token allowance is granted to.
///
/// Deployments differ here: either the sender approves every channel
/// individually, or it approves the registry once and the registry pulls the
/// funds on its behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spender {
    #[default]
    Channel,
    Registry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Identity of the registry itself, mixed into every channel address.
    pub address: Address,
    pub owner: Address,
    pub spender: Spender,
}

impl RegistryConfig {
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            owner,
            spender: Spender::default(),
        }
    }

    pub fn with_spender(mut self, spender: Spender) -> Self {
        self.spender = spender;
        self
    }

    /// The identity whose allowance a recharge of `channel` consumes.
    pub(super) fn spender_for(&self, channel: Address) -> Address {
        match self.spender {
            Spender::Channel => channel,
            Spender::Registry => self.address,
        }
    }
}
