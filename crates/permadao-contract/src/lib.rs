//! PermaDAO contract: state, proposal store, and interaction routing.
//!
//! The host feeds each interaction to [`Contract::handle`] together with the
//! current [`ContractState`] and receives either the replacement state or a
//! read result. Failed interactions leave the prior state untouched.

pub mod args;
pub mod router;
pub mod state;
pub mod store;

pub use router::{Contract, HandlerOutput, Interaction, QueryResult};
pub use state::{ContractState, GenesisConfig};
pub use store::{ProposalDraft, ProposalStore};
