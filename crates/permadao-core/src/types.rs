//! Proposal records and host metadata types.
//!
//! Token amounts are whole units in `u64`. Conviction is an `f64` score:
//! the recurrence that produces it divides by ten twice per step, so it is
//! not an integer, and it has to match the reference arithmetic exactly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Lifecycle state of a proposal.
///
/// `Active -> Canceled` is the only transition the contract performs.
/// `Executed` is part of the stored format but nothing produces it.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default,
    bincode::Encode, bincode::Decode,
)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    /// Open for staking.
    #[default]
    Active,
    /// Withdrawn by its creator. Terminal.
    Canceled,
    /// Passed and enacted. Terminal, currently unreachable.
    Executed,
}

impl ProposalStatus {
    /// Whether no further status transition is possible.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// Descriptive fields supplied when a proposal is created.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProposalMetadata {
    /// Short display name, at most 25 characters.
    pub name: String,
    /// Free-form version label.
    pub version: String,
    /// Public location; must use the `https://` scheme.
    pub url: String,
    /// 43-character reference to the content manifest on the host network.
    pub content_reference: String,
}

/// A funding proposal and its stake bookkeeping.
///
/// # Invariants
///
/// * `total_staked == stakes_by_voter.values().sum()`
/// * every `stakes_by_voter` value is positive
/// * `block_last == 0` until the first stake
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq,
    bincode::Encode, bincode::Decode,
)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    /// Zero-based position in the proposal list.
    pub id: u64,
    /// Id of the interaction that created the proposal.
    pub pid: String,
    /// Address that created the proposal. Only it may cancel.
    pub creator: Address,
    pub name: String,
    pub version: String,
    pub url: String,
    pub content_reference: String,
    pub status: ProposalStatus,
    /// Sum of all voter stakes.
    pub total_staked: u64,
    /// Conviction as of `block_last`.
    pub conviction_last: f64,
    /// Step at which `conviction_last` was computed; 0 means never.
    pub block_last: u64,
    /// Voter → staked amount. Entries are removed when they reach zero.
    pub stakes_by_voter: BTreeMap<Address, u64>,
}

impl Proposal {
    /// A fresh, unstaked, active proposal.
    pub fn new(id: u64, pid: String, creator: Address, metadata: ProposalMetadata) -> Self {
        Self {
            id,
            pid,
            creator,
            name: metadata.name,
            version: metadata.version,
            url: metadata.url,
            content_reference: metadata.content_reference,
            status: ProposalStatus::Active,
            total_staked: 0,
            conviction_last: 0.0,
            block_last: 0,
            stakes_by_voter: BTreeMap::new(),
        }
    }

    /// Amount `voter` has staked, 0 if none.
    pub fn stake_of(&self, voter: &Address) -> u64 {
        self.stakes_by_voter.get(voter).copied().unwrap_or(0)
    }

    /// Sum of voter stakes, `None` on overflow.
    pub fn summed_stakes(&self) -> Option<u64> {
        self.stakes_by_voter
            .values()
            .try_fold(0u64, |acc, v| acc.checked_add(*v))
    }
}

/// A name/value tag attached to a transaction on the host network.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
