//! Item response theory primitives.
//!
//! Implements the simplified one-parameter logistic (1PL) model the CAT
//! engine uses to relate ability and item difficulty.

/// Fixed discrimination applied to the ability/difficulty gap.
pub const DISCRIMINATION: f64 = 2.0;

/// The standard logistic function.
pub fn logistic(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Probability of a correct response under the 1PL model.
///
/// `p = 1 / (1 + e^(-2(ability - difficulty)))`
///
/// Strictly increasing in `ability` for a fixed `difficulty`; 0.5 exactly
/// when ability equals difficulty.
pub fn probability_correct(ability: f64, difficulty: f64) -> f64 {
    logistic(DISCRIMINATION * (ability - difficulty))
}
