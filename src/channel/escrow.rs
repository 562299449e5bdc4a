use tracing::{debug, info};

use super::{
    BalanceProof, Challenge, ChannelHandle, ChannelInfo, Operation, Role, Settlement,
    SettlementKind, Status,
};
use crate::{
    abiencode::types::{Address, U256},
    error::{Error, Result},
    sig,
    token::Token,
};

/// Terms a channel is created with. None of them can change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenParams {
    pub address: Address,
    pub sender: Address,
    pub receiver: Address,
    pub token: Address,
    pub challenge_period: u64,
    pub start_time: u64,
}

/// One escrow between a sender and a receiver over a single token.
///
/// The channel holds its deposit at its own [Channel::address] on the token.
/// Every transition checks all of its guards first, then moves tokens, and
/// only writes the new state once every token call succeeded. A rejected call
/// therefore leaves the channel untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    address: Address,
    sender: Address,
    receiver: Address,
    token: Address,
    challenge_period: u64,
    start_time: u64,
    status: Status,
    deposit: U256,
    withdrawn: U256,
    challenge: Option<Challenge>,
}

impl Channel {
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn deposit(&self) -> U256 {
        self.deposit
    }

    pub fn withdrawn(&self) -> U256 {
        self.withdrawn
    }

    pub fn challenge_period(&self) -> u64 {
        self.challenge_period
    }

    fn check_status(&self, operation: Operation, allowed: &[Status]) -> Result<()> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(Error::InvalidStatus {
                operation,
                status: self.status,
            })
        }
    }

    fn check_caller(&self, caller: Address, expected: Role) -> Result<()> {
        let allowed = match expected {
            Role::Sender => caller == self.sender,
            Role::Receiver => caller == self.receiver,
            Role::Participant => caller == self.sender || caller == self.receiver,
        };
        if allowed {
            Ok(())
        } else {
            Err(Error::Unauthorized { caller, expected })
        }
    }

    /// Guards shared by withdrawal and mutual settlement: the cumulative
    /// balance must be covered by the deposit and must strictly exceed what
    /// was already paid out.
    fn check_claim(&self, balance: U256) -> Result<()> {
        if balance > self.deposit {
            Err(Error::BalanceExceedsDeposit {
                balance,
                deposit: self.deposit,
            })
        } else if balance <= self.withdrawn {
            Err(Error::StaleBalance {
                balance,
                withdrawn: self.withdrawn,
            })
        } else {
            Ok(())
        }
    }

    fn verify_proof(
        &self,
        proof: BalanceProof,
        signature: &[u8],
        role: Role,
        expected: Address,
    ) -> Result<()> {
        let digest = proof.digest()?;
        let recovered = sig::recover_signer(digest, signature)
            .map_err(|source| Error::Signature { role, source })?;

        if recovered != expected {
            return Err(Error::InvalidSigner {
                expected: role,
                address: expected,
                recovered,
            });
        }
        Ok(())
    }

    /// Pays the receiver up to `balance`, refunds the rest of the deposit to
    /// the sender and closes the channel.
    fn settle<T: Token>(
        &mut self,
        token: &mut T,
        kind: SettlementKind,
        balance: U256,
    ) -> Result<Settlement> {
        // Callers guarantee withdrawn <= balance <= deposit.
        let receiver_payout = balance - self.withdrawn;
        let sender_refund = self.deposit - balance;

        if !receiver_payout.is_zero() {
            token.transfer(self.address, self.receiver, receiver_payout)?;
        }
        if !sender_refund.is_zero() {
            token.transfer(self.address, self.sender, sender_refund)?;
        }

        self.withdrawn = balance;
        self.status = Status::Settled;
        self.challenge = None;

        info!(
            channel = %self.address,
            ?kind,
            %balance,
            %receiver_payout,
            %sender_refund,
            "channel settled"
        );

        Ok(Settlement {
            kind,
            balance,
            receiver_payout,
            sender_refund,
        })
    }
}

impl ChannelHandle for Channel {
    fn open(params: OpenParams) -> Result<Self> {
        if params.sender.is_zero() {
            return Err(Error::ZeroAddress(Role::Sender));
        }
        if params.receiver.is_zero() {
            return Err(Error::ZeroAddress(Role::Receiver));
        }
        if params.sender == params.receiver {
            return Err(Error::SameParticipants);
        }
        if params.token.is_zero() {
            return Err(Error::TokenNotContract(params.token));
        }
        if params.challenge_period == 0 {
            return Err(Error::ZeroChallengePeriod);
        }

        Ok(Channel {
            address: params.address,
            sender: params.sender,
            receiver: params.receiver,
            token: params.token,
            challenge_period: params.challenge_period,
            start_time: params.start_time,
            status: Status::Initiated,
            deposit: U256::zero(),
            withdrawn: U256::zero(),
            challenge: None,
        })
    }

    fn address(&self) -> Address {
        self.address
    }

    fn sender(&self) -> Address {
        self.sender
    }

    fn receiver(&self) -> Address {
        self.receiver
    }

    fn token(&self) -> Address {
        self.token
    }

    fn info(&self) -> ChannelInfo {
        ChannelInfo {
            address: self.address,
            sender: self.sender,
            receiver: self.receiver,
            token: self.token,
            challenge_period: self.challenge_period,
            start_time: self.start_time,
            status: self.status,
            deposit: self.deposit,
            withdrawn: self.withdrawn,
        }
    }

    fn challenge(&self) -> Option<Challenge> {
        self.challenge
    }

    fn recharge<T: Token>(
        &mut self,
        token: &mut T,
        caller: Address,
        spender: Address,
        amount: U256,
    ) -> Result<()> {
        self.check_status(Operation::Recharge, &[Status::Initiated, Status::Recharged])?;
        self.check_caller(caller, Role::Sender)?;
        if amount.is_zero() {
            return Err(Error::ZeroAmount);
        }
        let deposit = self
            .deposit
            .checked_add(amount)
            .ok_or(Error::DepositOverflow)?;

        token.transfer_from(spender, self.sender, self.address, amount)?;

        self.deposit = deposit;
        self.status = Status::Recharged;
        debug!(channel = %self.address, %amount, %deposit, "channel recharged");
        Ok(())
    }

    fn withdraw<T: Token>(
        &mut self,
        token: &mut T,
        caller: Address,
        balance: U256,
        signature: &[u8],
    ) -> Result<U256> {
        self.check_status(Operation::Withdraw, &[Status::Recharged, Status::Withdrawn])?;
        self.check_caller(caller, Role::Receiver)?;
        self.check_claim(balance)?;
        self.verify_proof(
            BalanceProof::withdrawal(self.receiver, balance, self.address),
            signature,
            Role::Sender,
            self.sender,
        )?;

        let payout = balance - self.withdrawn;
        token.transfer(self.address, self.receiver, payout)?;

        self.withdrawn = balance;
        self.status = Status::Withdrawn;
        debug!(channel = %self.address, %balance, %payout, "receiver withdrew");
        Ok(payout)
    }

    fn mutual_settlement<T: Token>(
        &mut self,
        token: &mut T,
        caller: Address,
        balance: U256,
        sender_signature: &[u8],
        receiver_signature: &[u8],
    ) -> Result<Settlement> {
        self.check_status(
            Operation::MutualSettlement,
            &[Status::Recharged, Status::Withdrawn, Status::InChallenge],
        )?;
        self.check_caller(caller, Role::Participant)?;
        self.check_claim(balance)?;
        self.verify_proof(
            BalanceProof::withdrawal(self.receiver, balance, self.address),
            sender_signature,
            Role::Sender,
            self.sender,
        )?;
        self.verify_proof(
            BalanceProof::closing(self.sender, balance, self.address),
            receiver_signature,
            Role::Receiver,
            self.receiver,
        )?;

        self.settle(token, SettlementKind::Mutual, balance)
    }

    fn challenged_settlement(
        &mut self,
        caller: Address,
        balance: U256,
        now: u64,
    ) -> Result<Challenge> {
        self.check_status(
            Operation::ChallengedSettlement,
            &[Status::Recharged, Status::Withdrawn],
        )?;
        self.check_caller(caller, Role::Sender)?;
        if self.deposit.is_zero() {
            return Err(Error::EmptyDeposit);
        }
        if balance > self.deposit {
            return Err(Error::BalanceExceedsDeposit {
                balance,
                deposit: self.deposit,
            });
        }
        if balance < self.withdrawn {
            return Err(Error::BalanceBelowWithdrawn {
                balance,
                withdrawn: self.withdrawn,
            });
        }

        let challenge = Challenge {
            balance,
            start_time: now,
            period: self.challenge_period,
        };
        self.challenge = Some(challenge);
        self.status = Status::InChallenge;
        debug!(
            channel = %self.address,
            %balance,
            ends_at = challenge.ends_at(),
            "challenge started"
        );
        Ok(challenge)
    }

    fn after_challenge_settlement<T: Token>(
        &mut self,
        token: &mut T,
        caller: Address,
        now: u64,
    ) -> Result<Settlement> {
        self.check_status(Operation::AfterChallengeSettlement, &[Status::InChallenge])?;
        self.check_caller(caller, Role::Sender)?;
        let challenge = self.challenge.ok_or(Error::InvalidStatus {
            operation: Operation::AfterChallengeSettlement,
            status: self.status,
        })?;
        if !challenge.is_expired(now) {
            return Err(Error::ChallengeNotExpired {
                ends_at: challenge.ends_at(),
                now,
            });
        }

        self.settle(token, SettlementKind::Challenged, challenge.balance)
    }
}
