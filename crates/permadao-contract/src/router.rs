//! Interaction dispatch.
//!
//! [`Contract::handle`] is the state transition function: it takes the prior
//! state by reference, a caller, the caller's JSON input and the host
//! capabilities, and returns either a fresh state, a query result, or the
//! reason the interaction was rejected. The prior state is never modified.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use permadao_conviction::ConvictionEngine;
use permadao_core::traits::{BlockContext, ConvictionCalculator, TagResolver};
use permadao_core::{Address, ContractError, Proposal};

use crate::args::{self, IntegerRule};
use crate::state::ContractState;
use crate::store::ProposalDraft;

/// One caller request.
#[derive(Clone, Debug, PartialEq)]
pub struct Interaction {
    /// Identity the host bound to the request.
    pub caller: Address,
    /// JSON object with a `function` field and its arguments.
    pub input: Value,
}

/// Successful outcome of an interaction.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum HandlerOutput {
    /// A mutation succeeded; this is the complete new state.
    State(ContractState),
    /// A read succeeded; state is unchanged.
    Result(QueryResult),
}

/// Payload of a read.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum QueryResult {
    Name { name: String },
    Ticker { ticker: String },
    TotalSupply {
        #[serde(rename = "totalSupply")]
        total_supply: u64,
    },
    Balance { target: Address, balance: u64 },
    Proposal(Proposal),
}

/// The contract entry point, generic over the conviction math.
#[derive(Debug, Clone, Default)]
pub struct Contract<C = ConvictionEngine> {
    calculator: C,
}

impl Contract<ConvictionEngine> {
    /// Contract using the production [`ConvictionEngine`].
    pub fn new() -> Self {
        Self::with_calculator(ConvictionEngine::new())
    }
}

impl<C: ConvictionCalculator> Contract<C> {
    /// Contract computing conviction with `calculator`.
    pub fn with_calculator(calculator: C) -> Self {
        Self { calculator }
    }

    /// Apply `interaction` to `state`.
    ///
    /// Function names follow the contract's public interface; the older
    /// names (`addProposal`, `stakeToProposal`, `unstakeFromProposal`,
    /// `cancelProposal`, `getProposal`) are accepted as aliases.
    ///
    /// # Errors
    ///
    /// - [`ContractError::MissingRequiredArgument`] if `function` is absent
    /// - [`ContractError::InvalidString`] if `function` is not a string
    /// - [`ContractError::UnknownFunction`] for any other name
    /// - whatever the selected operation reports
    pub fn handle(
        &self,
        state: &ContractState,
        interaction: &Interaction,
        block: &dyn BlockContext,
        resolver: &dyn TagResolver,
    ) -> Result<HandlerOutput, ContractError> {
        let empty = Map::new();
        let input = interaction.input.as_object().unwrap_or(&empty);
        let caller = &interaction.caller;

        let function = match input.get("function") {
            None | Some(Value::Null) => {
                return Err(ContractError::MissingRequiredArgument("function"));
            }
            Some(Value::String(f)) => f.as_str(),
            Some(_) => return Err(ContractError::InvalidString("function")),
        };

        self.dispatch(state, caller, function, input, block, resolver)
            .inspect_err(|e| debug!(function, %caller, "interaction rejected: {e}"))
    }

    fn dispatch(
        &self,
        state: &ContractState,
        caller: &Address,
        function: &str,
        input: &Map<String, Value>,
        block: &dyn BlockContext,
        resolver: &dyn TagResolver,
    ) -> Result<HandlerOutput, ContractError> {
        match function {
            "name" => Ok(HandlerOutput::Result(QueryResult::Name {
                name: state.name.clone(),
            })),
            "ticker" => Ok(HandlerOutput::Result(QueryResult::Ticker {
                ticker: state.ticker.clone(),
            })),
            "totalSupply" => Ok(HandlerOutput::Result(QueryResult::TotalSupply {
                total_supply: state.total_supply,
            })),
            "balanceOf" => {
                let raw = args::string(input, "address").unwrap_or_default();
                let target = Address::parse(raw)?;
                let balance = state.balances.balance_of(&target);
                Ok(HandlerOutput::Result(QueryResult::Balance { target, balance }))
            }
            "transfer" => {
                if !state.balances.is_known(caller) {
                    return Err(ContractError::UnknownCaller);
                }
                // Any malformed quantity is an invalid amount for transfers.
                let qty = args::integer(input, "qty", IntegerRule::Positive)
                    .map_err(|_| ContractError::InvalidAmount)?;
                let to = args::string(input, "to").unwrap_or_default();

                let mut next = state.clone();
                next.balances.transfer(caller, to, qty)?;
                Ok(HandlerOutput::State(next))
            }
            "createProposal" | "addProposal" => {
                let draft = ProposalDraft {
                    name: args::string(input, "name"),
                    version: args::string(input, "version"),
                    url: args::string(input, "url"),
                    content_reference: args::string_any(input, &["contentReference", "txid"]),
                };

                let mut next = state.clone();
                next.proposals
                    .create(&next.balances, caller, draft, block, resolver)?;
                next.proposal_counter += 1;
                Ok(HandlerOutput::State(next))
            }
            "stake" | "stakeToProposal" => {
                let id = args::integer(input, "id", IntegerRule::NonNegative)?;
                let qty = args::integer(input, "qty", IntegerRule::Positive)?;
                let height = block.height();

                let mut next = state.clone();
                let ContractState { balances, proposals, .. } = &mut next;
                proposals.stake(balances, &self.calculator, id, caller, qty, height)?;
                Ok(HandlerOutput::State(next))
            }
            "unstake" | "unstakeFromProposal" => {
                let id = args::integer(input, "id", IntegerRule::NonNegative)?;
                let qty = args::integer(input, "qty", IntegerRule::Positive)?;
                let height = block.height();

                let mut next = state.clone();
                let ContractState { balances, proposals, .. } = &mut next;
                proposals.unstake(balances, &self.calculator, id, caller, qty, height)?;
                Ok(HandlerOutput::State(next))
            }
            "cancel" | "cancelProposal" => {
                let id = args::integer(input, "id", IntegerRule::NonNegative)?;

                let mut next = state.clone();
                next.proposals.cancel(id, caller)?;
                Ok(HandlerOutput::State(next))
            }
            "get" | "getProposal" => {
                let id = args::integer(input, "id", IntegerRule::NonNegative)?;
                let proposal = state.proposals.get(id)?.clone();
                Ok(HandlerOutput::Result(QueryResult::Proposal(proposal)))
            }
            other => Err(ContractError::UnknownFunction(other.to_string())),
        }
    }
}
