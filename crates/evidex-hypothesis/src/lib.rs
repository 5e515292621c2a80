// crates/evidex-hypothesis/src/lib.rs
// ============================================================================
// Crate: evidex-hypothesis
// Description: Generate, score, and adversarially test hypotheses.
// ============================================================================

//! # evidex-hypothesis
//!
//! The Hypothesis Engine: [`generate::generate`] turns assertions and
//! source claims into a candidate hypothesis set (falling back to a
//! deterministic three-archetype set rather than ever returning zero),
//! [`analyze::analyze`] runs one hypothesis through an ACH-style per-evidence
//! assessment pass, [`multi_perspective::multi_perspective`] runs the same
//! generation under several fixed personas and merges the result, and
//! [`quality::score_quality`] produces a meta-cognitive quality report over
//! a finished judgment.

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod adversarial;
pub mod analyze;
pub mod generate;
pub mod multi_perspective;
pub mod quality;

pub use adversarial::adversarially_test;
pub use analyze::AchResult;
pub use analyze::EvidenceJudgment;
pub use analyze::analyze;
pub use generate::FALLBACK_ARCHETYPES;
pub use generate::GenerateError;
pub use generate::generate;
pub use multi_perspective::DEFAULT_PERSONAS;
pub use multi_perspective::multi_perspective;
pub use quality::QualityReportV1;
pub use quality::score_quality;
