//! # permadao-core
//! Foundation types and traits for the PermaDAO conviction-voting contract.

pub mod address;
pub mod constants;
pub mod error;
pub mod host;
pub mod ledger;
pub mod traits;
pub mod types;

pub use address::Address;
pub use error::{ContractError, GenesisError, HostError, InvariantViolation};
pub use ledger::Ledger;
pub use types::{Proposal, ProposalMetadata, ProposalStatus, Tag};
