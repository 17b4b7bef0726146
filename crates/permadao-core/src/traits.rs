//! Trait interfaces for the PermaDAO contract.
//!
//! These traits are the seams between the contract and everything it does
//! not own:
//! - [`BlockContext`]: the step counter and interaction id (host implements)
//! - [`TagResolver`]: content reference lookup (host implements)
//! - [`ConvictionCalculator`]: conviction math (permadao-conviction implements)

use crate::error::HostError;
use crate::types::Tag;

/// The host's view of the interaction being evaluated.
///
/// Values must stay fixed for the lifetime of one interaction; the contract
/// reads the height once and uses it for every conviction update.
pub trait BlockContext {
    /// Current monotonic step (block height).
    fn height(&self) -> u64;

    /// Id of the interaction being evaluated.
    fn transaction_id(&self) -> &str;
}

/// Resolves a content reference to the tags of the transaction it names.
pub trait TagResolver {
    /// Tags attached to `reference`.
    ///
    /// A reference the host cannot find is an error, not an empty list.
    fn resolve_tags(&self, reference: &str) -> Result<Vec<Tag>, HostError>;
}

/// Pure computation of conviction scores.
///
/// Conviction follows the recurrence `c' = decay * c + stake`, evaluated once
/// per elapsed step. Implementations must be deterministic down to the bit:
/// every replica evaluating the same interaction has to agree on the result.
pub trait ConvictionCalculator: Send + Sync {
    /// Fraction of conviction carried from one step to the next.
    fn decay_factor(&self) -> f64;

    /// Conviction after `elapsed_steps` steps.
    ///
    /// The first `elapsed_steps - 1` steps accumulate `old_stake`, the stake
    /// that held over the interval; the last step accumulates `new_stake`.
    /// With `elapsed_steps == 0` only the last step runs.
    fn compute_conviction(
        &self,
        elapsed_steps: u64,
        previous: f64,
        old_stake: u64,
        new_stake: u64,
    ) -> f64;

    /// Conviction after one step at constant stake.
    ///
    /// Default implementation: `compute_conviction(1, previous, stake, stake)`.
    fn step(&self, previous: f64, stake: u64) -> f64 {
        self.compute_conviction(1, previous, stake, stake)
    }
}
