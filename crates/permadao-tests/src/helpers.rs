//! Shared helpers for integration tests.

use serde_json::{json, Value};

use permadao_contract::{Contract, ContractState, GenesisConfig, HandlerOutput, Interaction, QueryResult};
use permadao_core::host::{FixedBlock, MemoryTagResolver};
use permadao_core::{Address, ContractError, Tag};

/// Content reference registered as a manifest by [`resolver`].
pub const MANIFEST_REF: &str = "MMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMM";
/// Content reference registered with a non-manifest content type.
pub const HTML_REF: &str = "HHHHHHHHHHHHHHHHHHHHHHHHHHHHHHHHHHHHHHHHHHH";
/// Content reference registered without any `Content-Type` tag.
pub const UNTAGGED_REF: &str = "UUUUUUUUUUUUUUUUUUUUUUUUUUUUUUUUUUUUUUUUUUU";

/// A 43-character address made of one repeated character.
pub fn key(seed: char) -> String {
    seed.to_string().repeat(43)
}

/// The [`Address`] for [`key`]`(seed)`.
pub fn addr(seed: char) -> Address {
    Address::parse(&key(seed)).expect("seed address is well formed")
}

/// Genesis state with the given `(seed, balance)` allocation.
pub fn genesis(entries: &[(char, u64)]) -> ContractState {
    let config = GenesisConfig {
        name: "PermaDAO".into(),
        ticker: "PDAO".into(),
        balances: entries.iter().map(|(c, v)| (key(*c), *v)).collect(),
    };
    ContractState::genesis(&config).expect("valid genesis")
}

/// Resolver knowing [`MANIFEST_REF`], [`HTML_REF`] and [`UNTAGGED_REF`].
pub fn resolver() -> MemoryTagResolver {
    let mut r = MemoryTagResolver::new();
    r.insert_manifest(MANIFEST_REF);
    r.insert(HTML_REF, vec![Tag::new("Content-Type", "text/html")]);
    r.insert(UNTAGGED_REF, vec![Tag::new("App-Name", "permaUI")]);
    r
}

/// Run one interaction at `height` with txid `tx-<height>`.
pub fn call(
    state: &ContractState,
    caller: char,
    input: Value,
    height: u64,
) -> Result<HandlerOutput, ContractError> {
    let interaction = Interaction { caller: addr(caller), input };
    let block = FixedBlock::new(height, format!("tx-{height}"));
    Contract::new().handle(state, &interaction, &block, &resolver())
}

/// Run a mutation that must succeed, checking invariants on the result.
pub fn apply(state: &ContractState, caller: char, input: Value, height: u64) -> ContractState {
    match call(state, caller, input.clone(), height) {
        Ok(HandlerOutput::State(next)) => {
            if let Err(v) = next.check_invariants() {
                panic!("invariant broken after {input}: {v}");
            }
            next
        }
        Ok(HandlerOutput::Result(r)) => panic!("{input} returned a result: {r:?}"),
        Err(e) => panic!("{input} rejected: {e}"),
    }
}

/// Run an interaction that must fail.
pub fn reject(state: &ContractState, caller: char, input: Value, height: u64) -> ContractError {
    match call(state, caller, input.clone(), height) {
        Err(e) => e,
        Ok(out) => panic!("{input} unexpectedly succeeded: {out:?}"),
    }
}

/// Run a read that must succeed.
pub fn query(state: &ContractState, caller: char, input: Value) -> QueryResult {
    match call(state, caller, input.clone(), 1) {
        Ok(HandlerOutput::Result(r)) => r,
        Ok(HandlerOutput::State(_)) => panic!("{input} returned a state"),
        Err(e) => panic!("{input} rejected: {e}"),
    }
}

/// `createProposal` input for a valid manifest proposal named `name`.
pub fn proposal_input(name: &str) -> Value {
    json!({
        "function": "createProposal",
        "name": name,
        "version": "1.0.0",
        "url": "https://permadao.example",
        "contentReference": MANIFEST_REF,
    })
}

/// Balance of `seed` via the ledger.
pub fn balance(state: &ContractState, seed: char) -> u64 {
    state.balances.balance_of(&addr(seed))
}
