// crates/evidex-fusion/src/lib.rs
// ============================================================================
// Crate: evidex-fusion
// Description: Bayesian hypothesis-set updates and Dempster-Shafer
//              multi-source belief combination.
// ============================================================================

//! Two independent fusion modes, selectable per assertion:
//! [`bayesian`] applies one [`evidex_core::core::probability::EvidenceAssessment`]
//! at a time to a hypothesis's running posterior; [`ds`] combines several
//! source claims' belief masses over a single proposition via Dempster's
//! rule. Bit-identical results across fusion backends are explicitly not
//! required; only the documented invariants (monotonicity, associativity,
//! clamping) are.

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod bayesian;
pub mod ds;

pub use bayesian::apply_assessment;
pub use bayesian::renormalize;
pub use bayesian::uniform_prior;
pub use ds::ASSOCIATIVITY_TOLERANCE;
pub use ds::FusionError;
pub use ds::Mass;
pub use ds::combine;
pub use ds::combine_all;
