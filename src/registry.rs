//! Factory and router for channels.
//!
//! The registry creates channels, indexes them by participant and forwards
//! every state-changing call to the addressed channel, brokering the token
//! movements on the caller's behalf. Each call runs against a [Ledger] and is
//! all-or-nothing: a rejected call leaves the channel, the registry and the
//! token exactly as they were.

mod config;
mod events;


use alloc::{collections::BTreeMap, vec::Vec};
use serde::Serialize;
use tracing::{info, warn};

pub use config::{RegistryConfig, Spender};
pub use events::ChannelEvent;

use crate::{
    abiencode::{
        self,
        types::{Address, U256},
    },
    channel::{Challenge, Channel, ChannelHandle, ChannelInfo, OpenParams, Role, Settlement},
    error::{Error, Result},
    ledger::Ledger,
    token::Token,
    wire::EventBus,
};

/// Packed-encoded and hashed to derive a channel address.
#[derive(Serialize)]
struct ChannelSeed {
    registry: Address,
    sender: Address,
    nonce: U256,
}

/// Address of the `nonce`-th channel created by `registry`:
/// `keccak256(registry || sender || nonce:uint256)[12..]`.
pub fn channel_address(registry: Address, sender: Address, nonce: u64) -> Result<Address> {
    let hash = abiencode::to_hash(&ChannelSeed {
        registry,
        sender,
        nonce: nonce.into(),
    })?;
    Ok(Address::from_hash(hash))
}

#[derive(Debug)]
pub struct Registry<B: EventBus, C: ChannelHandle = Channel> {
    config: RegistryConfig,
    bus: B,
    channels: BTreeMap<Address, C>,
    by_sender: BTreeMap<Address, Vec<Address>>,
    by_receiver: BTreeMap<Address, Vec<Address>>,
    nonce: u64,
}

impl<B: EventBus, C: ChannelHandle> Registry<B, C> {
    pub fn new(config: RegistryConfig, bus: B) -> Self {
        Self {
            config,
            bus,
            channels: BTreeMap::new(),
            by_sender: BTreeMap::new(),
            by_receiver: BTreeMap::new(),
            nonce: 0,
        }
    }

    /// Create a channel from `caller` to `receiver` over `token`.
    pub fn create_channel<L: Ledger>(
        &mut self,
        ledger: &L,
        caller: Address,
        receiver: Address,
        token: Address,
        challenge_period: u64,
    ) -> Result<Address> {
        self.try_create_channel(ledger, caller, receiver, token, challenge_period)
            .inspect_err(|error| {
                warn!(%caller, %receiver, %token, %error, "channel creation rejected")
            })
    }

    fn try_create_channel<L: Ledger>(
        &mut self,
        ledger: &L,
        caller: Address,
        receiver: Address,
        token: Address,
        challenge_period: u64,
    ) -> Result<Address> {
        if caller.is_zero() {
            return Err(Error::ZeroAddress(Role::Sender));
        }
        if receiver.is_zero() {
            return Err(Error::ZeroAddress(Role::Receiver));
        }
        if caller == receiver {
            return Err(Error::SameParticipants);
        }
        if !ledger.is_contract(token) {
            return Err(Error::TokenNotContract(token));
        }
        if challenge_period == 0 {
            return Err(Error::ZeroChallengePeriod);
        }

        let address = channel_address(self.config.address, caller, self.nonce)?;
        let channel = C::open(OpenParams {
            address,
            sender: caller,
            receiver,
            token,
            challenge_period,
            start_time: ledger.timestamp(),
        })?;

        self.nonce += 1;
        self.channels.insert(address, channel);
        self.by_sender.entry(caller).or_default().push(address);
        self.by_receiver.entry(receiver).or_default().push(address);

        info!(channel = %address, sender = %caller, %receiver, %token, challenge_period, "channel created");
        self.bus.emit(ChannelEvent::Created {
            channel: address,
            sender: caller,
            receiver,
            token,
            challenge_period,
        });
        Ok(address)
    }

    /// Move `amount` from the sender's allowance into `channel`.
    pub fn recharge_channel<L: Ledger>(
        &mut self,
        ledger: &mut L,
        caller: Address,
        channel: Address,
        amount: U256,
    ) -> Result<()> {
        let spender = self.config.spender_for(channel);
        let deposit = self
            .with_channel(ledger, channel, |handle, token, _| {
                handle.recharge(token, caller, spender, amount)?;
                Ok(handle.info().deposit)
            })
            .inspect_err(|error| warn!(%channel, %caller, %amount, %error, "recharge rejected"))?;

        self.bus.emit(ChannelEvent::Recharged {
            channel,
            amount,
            deposit,
        });
        Ok(())
    }

    /// Claim `balance - withdrawn` with a withdrawal proof signed by the
    /// sender. Returns the amount paid to the receiver.
    pub fn withdraw_from_channel<L: Ledger>(
        &mut self,
        ledger: &mut L,
        caller: Address,
        channel: Address,
        balance: U256,
        signature: &[u8],
    ) -> Result<U256> {
        let payout = self
            .with_channel(ledger, channel, |handle, token, _| {
                handle.withdraw(token, caller, balance, signature)
            })
            .inspect_err(|error| warn!(%channel, %caller, %balance, %error, "withdrawal rejected"))?;

        self.bus.emit(ChannelEvent::Withdrawn {
            channel,
            balance,
            payout,
        });
        Ok(payout)
    }

    pub fn channel_mutual_settlement<L: Ledger>(
        &mut self,
        ledger: &mut L,
        caller: Address,
        channel: Address,
        balance: U256,
        sender_signature: &[u8],
        receiver_signature: &[u8],
    ) -> Result<Settlement> {
        let settlement = self
            .with_channel(ledger, channel, |handle, token, _| {
                handle.mutual_settlement(
                    token,
                    caller,
                    balance,
                    sender_signature,
                    receiver_signature,
                )
            })
            .inspect_err(|error| {
                warn!(%channel, %caller, %balance, %error, "mutual settlement rejected")
            })?;

        self.bus.emit(ChannelEvent::Settled {
            channel,
            settlement,
        });
        Ok(settlement)
    }

    /// Start a challenge declaring `balance` as owed to the receiver.
    pub fn channel_challenged_settlement<L: Ledger>(
        &mut self,
        ledger: &L,
        caller: Address,
        channel: Address,
        balance: U256,
    ) -> Result<Challenge> {
        let now = ledger.timestamp();
        let challenge = self
            .channels
            .get_mut(&channel)
            .ok_or(Error::UnknownChannel(channel))
            .and_then(|handle| handle.challenged_settlement(caller, balance, now))
            .inspect_err(|error| warn!(%channel, %caller, %balance, %error, "challenge rejected"))?;

        self.bus
            .emit(ChannelEvent::ChallengeStarted { channel, challenge });
        Ok(challenge)
    }

    /// Settle at the challenged balance once the challenge period elapsed.
    pub fn channel_after_challenge_settlement<L: Ledger>(
        &mut self,
        ledger: &mut L,
        caller: Address,
        channel: Address,
    ) -> Result<Settlement> {
        let settlement = self
            .with_channel(ledger, channel, |handle, token, now| {
                handle.after_challenge_settlement(token, caller, now)
            })
            .inspect_err(|error| {
                warn!(%channel, %caller, %error, "after challenge settlement rejected")
            })?;

        self.bus.emit(ChannelEvent::Settled {
            channel,
            settlement,
        });
        Ok(settlement)
    }

    /// Run `f` on a known channel and the token it holds.
    ///
    /// The token is restored from a snapshot if `f` fails, so token calls
    /// that already went through before the failure are undone as well.
    /// Taking the snapshot costs one [Clone] of `L::Token` per call, see
    /// [Ledger::Token].
    fn with_channel<L, R, F>(&mut self, ledger: &mut L, channel: Address, f: F) -> Result<R>
    where
        L: Ledger,
        F: FnOnce(&mut C, &mut L::Token, u64) -> Result<R>,
    {
        let handle = self
            .channels
            .get_mut(&channel)
            .ok_or(Error::UnknownChannel(channel))?;
        let now = ledger.timestamp();
        let token_address = handle.token();
        let token = ledger
            .token_mut(token_address)
            .ok_or(Error::UnknownToken(token_address))?;

        let snapshot = token.clone();
        let res = f(handle, token, now);
        if res.is_err() {
            *token = snapshot;
        }
        res
    }

    fn handle(&self, channel: Address) -> Result<&C> {
        self.channels
            .get(&channel)
            .ok_or(Error::UnknownChannel(channel))
    }

    pub fn channels_by_sender(&self, sender: Address) -> &[Address] {
        self.by_sender.get(&sender).map_or(&[], Vec::as_slice)
    }

    pub fn channels_by_receiver(&self, receiver: Address) -> &[Address] {
        self.by_receiver.get(&receiver).map_or(&[], Vec::as_slice)
    }

    pub fn channel_info(&self, channel: Address) -> Result<ChannelInfo> {
        self.handle(channel).map(C::info)
    }

    /// The open challenge of `channel`, `None` if there is none.
    pub fn challenge(&self, channel: Address) -> Result<Option<Challenge>> {
        self.handle(channel).map(C::challenge)
    }

    /// `(sender, receiver)` of `channel`.
    pub fn participants(&self, channel: Address) -> Result<(Address, Address)> {
        self.handle(channel)
            .map(|handle| (handle.sender(), handle.receiver()))
    }

    /// Tokens currently held in custody by `channel`.
    pub fn channel_balance<L: Ledger>(&self, ledger: &L, channel: Address) -> Result<U256> {
        let token_address = self.handle(channel)?.token();
        let token = ledger
            .token(token_address)
            .ok_or(Error::UnknownToken(token_address))?;
        Ok(token.balance_of(channel))
    }

    pub fn is_channel(&self, channel: Address) -> bool {
        self.channels.contains_key(&channel)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn owner(&self) -> Address {
        self.config.owner
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}
