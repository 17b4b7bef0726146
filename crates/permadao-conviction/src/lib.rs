//! # permadao-conviction: conviction accumulation engine.
//!
//! Conviction is a stake-weighted score that decays geometrically each step:
//! - **Recurrence**: `c' = CONV_ALPHA * c / PADD / 10 + stake`, evaluated in
//!   exactly that operation order so every replica agrees bit for bit.
//! - **Piecewise stake**: the stake that held over an interval drives every
//!   step but the last; the last step uses the stake after the change.
//! - **Saturation**: at constant stake the score settles at
//!   `stake / (1 - decay)`; the engine stops iterating once it gets there.

pub mod engine;

pub use engine::ConvictionEngine;
