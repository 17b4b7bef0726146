//! Error types for the PermaDAO contract.
use thiserror::Error;

/// Every way an interaction can be rejected.
///
/// A rejected interaction never mutates state. Variants are grouped by the
/// check that produces them; the order in which an operation runs its checks
/// decides which variant wins when several conditions hold at once.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    // identity
    #[error("caller is not found in the balances")] UnknownCaller,
    #[error("invalid address: {0:?}")] InvalidIdentity(String),
    // amounts
    #[error("quantity must be a positive, non-zero integer")] InvalidAmount,
    #[error("insufficient balance: have {have}, need {need}")] InsufficientBalance { have: u64, need: u64 },
    #[error("insufficient stake: have {have}, need {need}")] InsufficientStake { have: u64, need: u64 },
    #[error("arithmetic overflow")] ArithmeticOverflow,
    // argument shape
    #[error("argument {0} is not a string")] InvalidString(&'static str),
    #[error("url must start with https://")] InvalidUrl,
    #[error("invalid content reference: {0:?}")] InvalidReference(String),
    #[error("missing required argument {0}")] MissingRequiredArgument(&'static str),
    #[error("argument {0} must be an integer")] NotAnInteger(&'static str),
    #[error("argument {0} must not be negative")] NegativeNotAllowed(&'static str),
    #[error("unknown function: {0}")] UnknownFunction(String),
    // proposals
    #[error("proposal {0} does not exist")] InvalidProposalId(u64),
    #[error("proposal {0} is not active")] ProposalNotActive(u64),
    #[error("caller has no stake on proposal {0}")] StakerNotFound(u64),
    #[error("caller is not permitted to modify proposal {0}")] Unauthorized(u64),
    #[error("proposal {0} is already canceled")] AlreadyCanceled(u64),
    // content metadata
    #[error("missing required tag {0}")] MissingTag(&'static str),
    #[error("wrong content type: {0:?}")] WrongContentType(String),
}

/// Failures reported by the host environment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("reference not found: {0}")] ReferenceNotFound(String),
}

/// Failures building the initial state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenesisError {
    #[error("invalid genesis address: {0:?}")] InvalidAddress(String),
    #[error("genesis allocates no tokens")] EmptyAllocation,
    #[error("total supply {0} exceeds the safe integer ceiling")] SupplyTooLarge(u64),
    #[error("total supply overflows")] SupplyOverflow,
    #[error("empty {0}")] EmptyField(&'static str),
}

/// A broken state invariant, found by `ContractState::check_invariants`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("supply mismatch: liquid {liquid} + staked {staked} != total {total}")] SupplyMismatch { liquid: u64, staked: u64, total: u64 },
    #[error("proposal {id}: total staked {recorded} != sum of stakes {summed}")] StakeMismatch { id: u64, recorded: u64, summed: u64 },
    #[error("proposal {id}: zero stake entry for {voter}")] ZeroStakeEntry { id: u64, voter: String },
    #[error("proposal at index {index} has id {id}")] IdMismatch { index: u64, id: u64 },
    #[error("proposal counter {counter} != proposal count {count}")] CounterMismatch { counter: u64, count: u64 },
    #[error("sum overflows")] Overflow,
}
