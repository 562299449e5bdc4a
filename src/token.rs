//! The fungible token collaborator.
//!
//! Channels and the registry never interpret token semantics beyond the five
//! operations of [Token]. Amounts are already scaled integers.

use alloc::collections::BTreeMap;
use thiserror::Error;

use crate::abiencode::types::{Address, U256};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("insufficient balance: {available} < {required}")]
    InsufficientBalance { available: U256, required: U256 },
    #[error("insufficient allowance: {available} < {required}")]
    InsufficientAllowance { available: U256, required: U256 },
    /// The token returned `false` or reverted for a reason of its own
    #[error("transfer rejected by token {0}")]
    Rejected(Address),
}

/// ERC-20 like token surface.
///
/// `caller` is the identity invoking the operation (`msg.sender` on the
/// token contract), which is who pays in [Token::transfer] and who spends the
/// allowance in [Token::transfer_from].
pub trait Token {
    fn address(&self) -> Address;

    fn transfer(&mut self, caller: Address, recipient: Address, amount: U256)
        -> Result<(), TokenError>;

    fn transfer_from(
        &mut self,
        caller: Address,
        owner: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<(), TokenError>;

    fn approve(&mut self, caller: Address, spender: Address, amount: U256)
        -> Result<(), TokenError>;

    fn balance_of(&self, owner: Address) -> U256;

    fn allowance(&self, owner: Address, spender: Address) -> U256;
}

/// In-memory token with standard ERC-20 semantics.
///
/// Used as the reference collaborator and in tests. [MemoryToken::reject_recipient]
/// makes every transfer to one address fail, to exercise the abort paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryToken {
    address: Address,
    balances: BTreeMap<Address, U256>,
    allowances: BTreeMap<(Address, Address), U256>,
    rejected_recipient: Option<Address>,
}

impl MemoryToken {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ..Default::default()
        }
    }

    /// Credit `amount` to `to` out of thin air (test setup only).
    pub fn mint(&mut self, to: Address, amount: U256) {
        let balance = self.balances.entry(to).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn reject_recipient(&mut self, recipient: Option<Address>) {
        self.rejected_recipient = recipient;
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        if self.rejected_recipient == Some(to) {
            return Err(TokenError::Rejected(self.address));
        }

        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                available,
                required: amount,
            });
        }

        self.balances.insert(from, available - amount);
        let balance = self.balances.entry(to).or_default();
        *balance = balance.saturating_add(amount);
        Ok(())
    }
}

impl Token for MemoryToken {
    fn address(&self) -> Address {
        self.address
    }

    fn transfer(
        &mut self,
        caller: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        self.move_balance(caller, recipient, amount)
    }

    fn transfer_from(
        &mut self,
        caller: Address,
        owner: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let available = self.allowance(owner, caller);
        if available < amount {
            return Err(TokenError::InsufficientAllowance {
                available,
                required: amount,
            });
        }

        self.move_balance(owner, recipient, amount)?;
        self.allowances.insert((owner, caller), available - amount);
        Ok(())
    }

    fn approve(
        &mut self,
        caller: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        self.allowances.insert((caller, spender), amount);
        Ok(())
    }

    fn balance_of(&self, owner: Address) -> U256 {
        self.balances.get(&owner).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }
}
