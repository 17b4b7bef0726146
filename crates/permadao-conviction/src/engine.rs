//! Conviction engine implementing the [`ConvictionCalculator`] trait.
//!
//! Evaluates the decay recurrence one step at a time in `f64`. The operation
//! order inside a step is fixed: multiply by `CONV_ALPHA`, divide by `PADD`,
//! divide by 10, add the stake. Reordering (for example multiplying by a
//! precomputed 0.9) changes the rounding and therefore the stored scores.

use permadao_core::constants::{CONV_ALPHA, PADD};
use permadao_core::traits::ConvictionCalculator;
use tracing::trace;

/// The production conviction calculator.
#[derive(Debug, Clone, Default)]
pub struct ConvictionEngine;

impl ConvictionEngine {
    /// Create a new ConvictionEngine.
    pub fn new() -> Self {
        Self
    }

    /// Conviction at which a constant `stake` stops changing the score:
    /// `stake / (1 - decay)`.
    pub fn steady_state(&self, stake: u64) -> f64 {
        stake as f64 / (1.0 - self.decay_factor())
    }
}

/// One step of the recurrence.
fn decay_step(conviction: f64, stake: f64) -> f64 {
    CONV_ALPHA as f64 * conviction / PADD as f64 / 10.0 + stake
}

impl ConvictionCalculator for ConvictionEngine {
    fn decay_factor(&self) -> f64 {
        CONV_ALPHA as f64 / PADD as f64 / 10.0
    }

    fn compute_conviction(
        &self,
        elapsed_steps: u64,
        previous: f64,
        old_stake: u64,
        new_stake: u64,
    ) -> f64 {
        let old = old_stake as f64;
        let mut conviction = previous;
        let mut steps = 0u64;

        // Every step is monotone in `conviction`, so the sequence is monotone
        // and settles on a fixed point. Once there, the remaining steps
        // cannot change it.
        for _ in 1..elapsed_steps {
            let next = decay_step(conviction, old);
            if next == conviction {
                break;
            }
            conviction = next;
            steps += 1;
        }
        if steps + 1 < elapsed_steps {
            trace!(steps, elapsed_steps, "conviction reached fixed point early");
        }

        decay_step(conviction, new_stake as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn engine() -> ConvictionEngine {
        ConvictionEngine::new()
    }

    /// Straight transcription of the recurrence, no early exit.
    fn reference(elapsed: u64, previous: f64, old: u64, new: u64) -> f64 {
        let mut c = previous;
        let mut i = 0;
        while i + 1 < elapsed {
            c = 90.0 * c / 10.0 / 10.0 + old as f64;
            i += 1;
        }
        90.0 * c / 10.0 / 10.0 + new as f64
    }

    // --- decay_factor ---

    #[test]
    fn decay_factor_matches_constants() {
        assert_eq!(engine().decay_factor(), 0.9);
    }

    // --- compute_conviction ---

    #[test]
    fn single_step_ignores_old_stake() {
        let e = engine();
        let c = 1234.5;
        let expected = 90.0 * c / 10.0 / 10.0 + 77.0;
        assert_eq!(e.compute_conviction(1, c, 0, 77), expected);
        assert_eq!(e.compute_conviction(1, c, 999_999, 77), expected);
    }

    #[test]
    fn zero_elapsed_still_runs_final_step() {
        let e = engine();
        let c = 500.0;
        let expected = 90.0 * c / 10.0 / 10.0 + 30.0;
        assert_eq!(e.compute_conviction(0, c, 10, 30), expected);
        assert_eq!(
            e.compute_conviction(0, c, 10, 30),
            e.compute_conviction(1, c, 10, 30)
        );
    }

    #[test]
    fn first_stake_from_zero() {
        // Baseline one step back: conviction becomes the new stake.
        assert_eq!(engine().compute_conviction(1, 0.0, 0, 30), 30.0);
    }

    #[test]
    fn known_values() {
        let e = engine();
        // 100, then 0.9 * 100 + 100.
        assert_eq!(e.compute_conviction(2, 0.0, 100, 100), 190.0);
        // 100, 190, then 0.9 * 190 + 50.
        assert_eq!(e.compute_conviction(3, 0.0, 100, 50), 221.0);
        // Unstaking everything: decay only.
        assert_eq!(e.compute_conviction(2, 100.0, 0, 0), 81.0);
    }

    #[test]
    fn matches_reference_recurrence() {
        let e = engine();
        for elapsed in [0, 1, 2, 3, 10, 57, 400] {
            for (prev, old, new) in [(0.0, 0, 5), (13.37, 40, 0), (1e6, 7, 7_000)] {
                assert_eq!(
                    e.compute_conviction(elapsed, prev, old, new).to_bits(),
                    reference(elapsed, prev, old, new).to_bits(),
                    "elapsed={elapsed} prev={prev} old={old} new={new}"
                );
            }
        }
    }

    #[test]
    fn long_interval_saturates() {
        let e = engine();
        let long = e.compute_conviction(1_000_000_000, 0.0, 100, 100);
        let short = e.compute_conviction(5_000, 0.0, 100, 100);
        assert_eq!(long.to_bits(), short.to_bits());
        assert!((long - e.steady_state(100)).abs() < 1e-6, "saturated at {long}");
    }

    #[test]
    fn long_interval_without_stake_decays_to_new_stake() {
        let e = engine();
        let c = e.compute_conviction(u64::MAX, 1e12, 0, 25);
        assert_eq!(c, 25.0);
    }

    #[test]
    fn steady_state_is_ten_times_stake() {
        let s = engine().steady_state(100);
        assert!((s - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn engine_is_object_safe() {
        let e = engine();
        let dyn_e: &dyn ConvictionCalculator = &e;
        assert_eq!(dyn_e.step(0.0, 9), 9.0);
    }

    // --- proptest ---

    proptest! {
        #[test]
        fn deterministic(
            elapsed in 0u64..5_000,
            prev in 0.0f64..1e12,
            old in 0u64..1_000_000_000,
            new in 0u64..1_000_000_000,
        ) {
            let e = engine();
            let a = e.compute_conviction(elapsed, prev, old, new);
            let b = e.compute_conviction(elapsed, prev, old, new);
            prop_assert_eq!(a.to_bits(), b.to_bits());
        }

        #[test]
        fn early_exit_is_exact(
            elapsed in 0u64..3_000,
            prev in 0.0f64..1e9,
            old in 0u64..1_000_000,
            new in 0u64..1_000_000,
        ) {
            let got = engine().compute_conviction(elapsed, prev, old, new);
            let want = reference(elapsed, prev, old, new);
            prop_assert_eq!(got.to_bits(), want.to_bits());
        }

        #[test]
        fn non_negative(
            elapsed in 0u64..1_000,
            prev in 0.0f64..1e9,
            old in 0u64..1_000_000,
            new in 0u64..1_000_000,
        ) {
            prop_assert!(engine().compute_conviction(elapsed, prev, old, new) >= 0.0);
        }

        #[test]
        fn monotone_in_new_stake(
            elapsed in 0u64..1_000,
            prev in 0.0f64..1e9,
            old in 0u64..1_000_000,
            a in 0u64..1_000_000,
            b in 0u64..1_000_000,
        ) {
            let e = engine();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                e.compute_conviction(elapsed, prev, old, lo)
                    <= e.compute_conviction(elapsed, prev, old, hi)
            );
        }
    }
}
