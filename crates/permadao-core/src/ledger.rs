//! Liquid token balances.
//!
//! The ledger maps addresses to whole-token balances. An address is *known*
//! once it has an entry, even if that entry is zero: debiting an account to
//! zero keeps the entry, and the first credit to an unknown address inserts
//! it with balance 0 before adding the amount. Nothing else creates entries.
//!
//! Every mutating method checks all of its preconditions before writing, so a
//! returned error always means the ledger is untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::ContractError;

/// Address → liquid balance.
#[derive(
    Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
#[serde(transparent)]
pub struct Ledger(BTreeMap<Address, u64>);

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Balance of `address`, or 0 if it has no entry.
    pub fn balance_of(&self, address: &Address) -> u64 {
        self.0.get(address).copied().unwrap_or(0)
    }

    /// The recorded balance of `address`, `None` if unknown.
    pub fn entry(&self, address: &Address) -> Option<u64> {
        self.0.get(address).copied()
    }

    /// Whether `address` has a ledger entry.
    pub fn is_known(&self, address: &Address) -> bool {
        self.0.contains_key(address)
    }

    /// Move `amount` from `from` to the address spelled `to`.
    ///
    /// Checks, in order: the sender is known, the amount is positive, the
    /// sender can cover it, and `to` is a well-formed address. The recipient
    /// need not exist yet.
    ///
    /// # Errors
    ///
    /// - [`ContractError::UnknownCaller`] if `from` has no entry
    /// - [`ContractError::InvalidAmount`] if `amount` is zero
    /// - [`ContractError::InsufficientBalance`] if `amount` exceeds the balance
    /// - [`ContractError::InvalidIdentity`] if `to` is malformed
    pub fn transfer(&mut self, from: &Address, to: &str, amount: u64) -> Result<(), ContractError> {
        let have = self.entry(from).ok_or(ContractError::UnknownCaller)?;
        if amount == 0 {
            return Err(ContractError::InvalidAmount);
        }
        if have < amount {
            return Err(ContractError::InsufficientBalance { have, need: amount });
        }
        let to = Address::parse(to)?;

        if *from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(ContractError::ArithmeticOverflow)?;
        self.0.insert(from.clone(), have - amount);
        self.0.insert(to, credited);
        Ok(())
    }

    /// Remove `amount` from a known account.
    ///
    /// # Errors
    ///
    /// - [`ContractError::UnknownCaller`] if `address` has no entry
    /// - [`ContractError::InsufficientBalance`] if `amount` exceeds the balance
    pub fn debit(&mut self, address: &Address, amount: u64) -> Result<(), ContractError> {
        let have = self.entry(address).ok_or(ContractError::UnknownCaller)?;
        let remaining = have
            .checked_sub(amount)
            .ok_or(ContractError::InsufficientBalance { have, need: amount })?;
        self.0.insert(address.clone(), remaining);
        Ok(())
    }

    /// Add `amount` to `address`, inserting a zero entry first if unknown.
    pub fn credit(&mut self, address: &Address, amount: u64) -> Result<(), ContractError> {
        let credited = self
            .balance_of(address)
            .checked_add(amount)
            .ok_or(ContractError::ArithmeticOverflow)?;
        self.0.insert(address.clone(), credited);
        Ok(())
    }

    /// Sum of all liquid balances, `None` on overflow.
    pub fn total(&self) -> Option<u64> {
        self.0.values().try_fold(0u64, |acc, v| acc.checked_add(*v))
    }

    /// Number of known accounts.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the ledger has no accounts.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<Address, u64>> for Ledger {
    fn from(balances: BTreeMap<Address, u64>) -> Self {
        Self(balances)
    }
}

impl FromIterator<(Address, u64)> for Ledger {
    fn from_iter<I: IntoIterator<Item = (Address, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
