use super::{Challenge, ChannelInfo, OpenParams, Settlement};
use crate::{
    abiencode::types::{Address, U256},
    error::Result,
    token::Token,
};

/// Capability the registry uses to drive a channel.
///
/// The registry never looks inside a channel: it forwards validated calls
/// through this trait, passing in the token collaborator and the current time.
/// `caller` is always the identity that invoked the registry.
pub trait ChannelHandle: Sized {
    fn open(params: OpenParams) -> Result<Self>;

    fn address(&self) -> Address;
    fn sender(&self) -> Address;
    fn receiver(&self) -> Address;
    fn token(&self) -> Address;

    fn info(&self) -> ChannelInfo;

    /// The open challenge, if the channel is `InChallenge`.
    fn challenge(&self) -> Option<Challenge>;

    /// Pull `amount` from the sender into the channel. `spender` is the
    /// identity holding the sender's allowance.
    fn recharge<T: Token>(
        &mut self,
        token: &mut T,
        caller: Address,
        spender: Address,
        amount: U256,
    ) -> Result<()>;

    /// Pay out `balance - withdrawn` to the receiver. Returns the payout.
    fn withdraw<T: Token>(
        &mut self,
        token: &mut T,
        caller: Address,
        balance: U256,
        signature: &[u8],
    ) -> Result<U256>;

    fn mutual_settlement<T: Token>(
        &mut self,
        token: &mut T,
        caller: Address,
        balance: U256,
        sender_signature: &[u8],
        receiver_signature: &[u8],
    ) -> Result<Settlement>;

    /// Declare the balance owed to the receiver and start the challenge timer.
    fn challenged_settlement(&mut self, caller: Address, balance: U256, now: u64)
        -> Result<Challenge>;

    fn after_challenge_settlement<T: Token>(
        &mut self,
        token: &mut T,
        caller: Address,
        now: u64,
    ) -> Result<Settlement>;
}
