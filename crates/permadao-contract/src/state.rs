//! Contract state, genesis, and state-wide invariants.
//!
//! [`ContractState`] is the whole state threaded through every interaction.
//! It is created once by [`ContractState::genesis`] and afterwards only
//! replaced by the router's output, never patched in place by callers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use permadao_core::constants::MAX_SAFE_SUPPLY;
use permadao_core::{Address, GenesisError, InvariantViolation, Ledger};

use crate::store::ProposalStore;

/// Initial token allocation and token identity.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GenesisConfig {
    pub name: String,
    pub ticker: String,
    /// Address → initial balance. Keys are validated by [`ContractState::genesis`].
    pub balances: BTreeMap<String, u64>,
}

/// The complete contract state.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq,
    bincode::Encode, bincode::Decode,
)]
#[serde(rename_all = "camelCase")]
pub struct ContractState {
    pub name: String,
    pub ticker: String,
    /// Fixed at genesis; liquid plus staked tokens always add up to it.
    pub total_supply: u64,
    pub balances: Ledger,
    pub proposals: ProposalStore,
    /// Number of proposals ever created.
    pub proposal_counter: u64,
}

impl ContractState {
    /// Build the initial state from a genesis allocation.
    ///
    /// # Errors
    ///
    /// - [`GenesisError::EmptyField`] if the name or ticker is empty
    /// - [`GenesisError::InvalidAddress`] if a key is not a 43-character address
    /// - [`GenesisError::SupplyOverflow`] if the balances do not fit in `u64`
    /// - [`GenesisError::EmptyAllocation`] if no tokens are allocated
    /// - [`GenesisError::SupplyTooLarge`] above [`MAX_SAFE_SUPPLY`]
    pub fn genesis(config: &GenesisConfig) -> Result<Self, GenesisError> {
        if config.name.is_empty() {
            return Err(GenesisError::EmptyField("name"));
        }
        if config.ticker.is_empty() {
            return Err(GenesisError::EmptyField("ticker"));
        }

        let mut balances = BTreeMap::new();
        let mut total_supply = 0u64;
        for (raw, amount) in &config.balances {
            let address =
                Address::parse(raw).map_err(|_| GenesisError::InvalidAddress(raw.clone()))?;
            total_supply = total_supply
                .checked_add(*amount)
                .ok_or(GenesisError::SupplyOverflow)?;
            balances.insert(address, *amount);
        }

        if total_supply == 0 {
            return Err(GenesisError::EmptyAllocation);
        }
        if total_supply > MAX_SAFE_SUPPLY {
            return Err(GenesisError::SupplyTooLarge(total_supply));
        }

        Ok(Self {
            name: config.name.clone(),
            ticker: config.ticker.clone(),
            total_supply,
            balances: Ledger::from(balances),
            proposals: ProposalStore::new(),
            proposal_counter: 0,
        })
    }

    /// Verify every cross-ledger invariant.
    ///
    /// Checks, in order: the counter matches the proposal count, each
    /// proposal's id is its index, each proposal's `total_staked` equals the
    /// sum of its stakes with no zero entries, and liquid plus staked tokens
    /// equal the total supply.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let count = self.proposals.len() as u64;
        if self.proposal_counter != count {
            return Err(InvariantViolation::CounterMismatch {
                counter: self.proposal_counter,
                count,
            });
        }

        let mut staked = 0u64;
        for (index, proposal) in self.proposals.iter().enumerate() {
            let index = index as u64;
            if proposal.id != index {
                return Err(InvariantViolation::IdMismatch { index, id: proposal.id });
            }
            if let Some((voter, _)) = proposal.stakes_by_voter.iter().find(|(_, v)| **v == 0) {
                return Err(InvariantViolation::ZeroStakeEntry {
                    id: proposal.id,
                    voter: voter.to_string(),
                });
            }
            let summed = proposal.summed_stakes().ok_or(InvariantViolation::Overflow)?;
            if summed != proposal.total_staked {
                return Err(InvariantViolation::StakeMismatch {
                    id: proposal.id,
                    recorded: proposal.total_staked,
                    summed,
                });
            }
            staked = staked
                .checked_add(proposal.total_staked)
                .ok_or(InvariantViolation::Overflow)?;
        }

        let liquid = self.balances.total().ok_or(InvariantViolation::Overflow)?;
        if liquid.checked_add(staked) != Some(self.total_supply) {
            return Err(InvariantViolation::SupplyMismatch {
                liquid,
                staked,
                total: self.total_supply,
            });
        }
        Ok(())
    }

    /// BLAKE3 hash of the canonical binary encoding, hex-encoded.
    ///
    /// Two replicas that applied the same interactions to the same genesis
    /// produce the same fingerprint.
    pub fn fingerprint(&self) -> Result<String, bincode::error::EncodeError> {
        let bytes = bincode::encode_to_vec(self, bincode::config::standard())?;
        Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
    }
}
