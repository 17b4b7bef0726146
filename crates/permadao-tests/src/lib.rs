//! Integration test suite for the PermaDAO contract.
//!
//! Tests drive the contract only through `Contract::handle`, the way a host
//! would, and check the state-wide invariants after every transition.

pub mod helpers;
