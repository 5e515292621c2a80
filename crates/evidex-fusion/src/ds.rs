// crates/evidex-fusion/src/ds.rs
// ============================================================================
// Module: Dempster-Shafer Combination
// Description: Multi-source belief fusion for a single proposition.
// Purpose: Combine independent source masses into one aggregate confidence.
// Dependencies: none beyond std
// ============================================================================

//! ## Overview
//! Each source claim contributes a [`Mass`] triple over the frame
//! `{true, false, uncertain}`. Two masses combine via Dempster's rule,
//! normalized by the conflict mass `K`; [`combine_all`] folds an arbitrary
//! number of masses and is associative to within
//! [`ASSOCIATIVITY_TOLERANCE`] regardless of reduction order. Numerical
//! exactness across fusion backends is explicitly not required; only the
//! invariants below are.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

/// Tolerance within which any reduction order over the same mass set must
/// agree.
pub const ASSOCIATIVITY_TOLERANCE: f64 = 1e-9;

/// A belief-mass triple over the frame `{true, false, uncertain}`.
///
/// # Invariants
/// - `m_true + m_false + m_uncertain` is always `1.0` (within floating-point
///   rounding): every unit of uncommitted belief lives in `m_uncertain`.
/// - Each component is in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mass {
    /// Belief mass assigned to the proposition being true.
    pub m_true: f64,
    /// Belief mass assigned to the proposition being false.
    pub m_false: f64,
    /// Belief mass left uncommitted (neither true nor false).
    pub m_uncertain: f64,
}

impl Mass {
    /// Derives a mass triple from one source claim's probability and
    /// credibility: `m_true = p_claim * credibility`, `m_false = (1 -
    /// p_claim) * credibility`, `m_uncertain = 1 - credibility`.
    ///
    /// `p_claim` and `credibility` are each clamped to `[0, 1]` first.
    #[must_use]
    pub fn from_claim(p_claim: f64, credibility: f64) -> Self {
        let p_claim = p_claim.clamp(0.0, 1.0);
        let credibility = credibility.clamp(0.0, 1.0);
        Self {
            m_true: p_claim * credibility,
            m_false: (1.0 - p_claim) * credibility,
            m_uncertain: 1.0 - credibility,
        }
    }

    /// The vacuous mass: all belief uncommitted. The identity element of
    /// [`combine`] (combining with it reproduces the other operand, up to
    /// floating-point rounding).
    #[must_use]
    pub fn vacuous() -> Self {
        Self { m_true: 0.0, m_false: 0.0, m_uncertain: 1.0 }
    }

    /// Aggregate confidence derived from this mass: `m_true +
    /// 0.5 * m_uncertain`.
    #[must_use]
    pub fn aggregate_confidence(&self) -> f64 {
        self.m_true + 0.5 * self.m_uncertain
    }
}

/// Error raised when two masses cannot be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FusionError {
    /// The combined masses are in total conflict (`K` normalizer is zero),
    /// so Dempster's rule is undefined.
    #[error("total conflict between combined masses, cannot normalize")]
    TotalConflict,
    /// [`combine_all`] was called with an empty mass list.
    #[error("cannot combine an empty set of masses")]
    EmptyMassSet,
}

/// Combines two masses via Dempster's rule, returning the combined mass and
/// the conflict degree `K` consumed in normalization.
///
/// # Errors
/// Returns [`FusionError::TotalConflict`] when the two masses are in total
/// conflict (normalizer would be zero).
pub fn combine(a: Mass, b: Mass) -> Result<(Mass, f64), FusionError> {
    let conflict = a.m_true * b.m_false + a.m_false * b.m_true;
    let normalizer = 1.0 - conflict;
    if normalizer <= 0.0 {
        return Err(FusionError::TotalConflict);
    }

    let m_true = (a.m_true * b.m_true + a.m_true * b.m_uncertain + a.m_uncertain * b.m_true)
        / normalizer;
    let m_false = (a.m_false * b.m_false + a.m_false * b.m_uncertain + a.m_uncertain * b.m_false)
        / normalizer;
    let m_uncertain = (a.m_uncertain * b.m_uncertain) / normalizer;

    Ok((Mass { m_true, m_false, m_uncertain }, conflict))
}

/// Folds `masses` left-to-right through [`combine`], returning the final
/// mass and the cumulative conflict degree `K = 1 - Π(1 - K_i)` across every
/// pairwise combination step.
///
/// Dempster's rule is associative and commutative, so the fold order does
/// not affect the result beyond [`ASSOCIATIVITY_TOLERANCE`];
/// callers may reduce masses in any convenient order.
///
/// # Errors
/// Returns [`FusionError::EmptyMassSet`] if `masses` is empty, or
/// [`FusionError::TotalConflict`] if any intermediate combination is in
/// total conflict.
pub fn combine_all(masses: &[Mass]) -> Result<(Mass, f64), FusionError> {
    let mut iter = masses.iter().copied();
    let Some(first) = iter.next() else {
        return Err(FusionError::EmptyMassSet);
    };

    let mut acc = first;
    let mut retained_fraction = 1.0;
    for next in iter {
        let (combined, conflict) = combine(acc, next)?;
        acc = combined;
        retained_fraction *= 1.0 - conflict;
    }

    Ok((acc, 1.0 - retained_fraction))
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    fn mass_strategy() -> impl Strategy<Value = Mass> {
        (0.0..=1.0_f64, 0.0..=1.0_f64).prop_map(|(p, credibility)| Mass::from_claim(p, credibility))
    }

    proptest! {
        #[test]
        fn combine_all_is_order_independent(
            a in mass_strategy(),
            b in mass_strategy(),
            c in mass_strategy(),
        ) {
            let forward = combine_all(&[a, b, c]);
            let reversed = combine_all(&[c, b, a]);
            match (forward, reversed) {
                (Ok((forward_mass, _)), Ok((reversed_mass, _))) => {
                    prop_assert!((forward_mass.m_true - reversed_mass.m_true).abs() < ASSOCIATIVITY_TOLERANCE);
                    prop_assert!((forward_mass.m_false - reversed_mass.m_false).abs() < ASSOCIATIVITY_TOLERANCE);
                    prop_assert!((forward_mass.m_uncertain - reversed_mass.m_uncertain).abs() < ASSOCIATIVITY_TOLERANCE);
                }
                (Err(a), Err(b)) => prop_assert_eq!(a, b),
                _ => prop_assert!(false, "forward and reversed combination disagreed on total conflict"),
            }
        }

        #[test]
        fn aggregate_confidence_stays_in_unit_interval(mass in mass_strategy()) {
            let confidence = mass.aggregate_confidence();
            prop_assert!((0.0..=1.0).contains(&confidence));
        }
    }
}
