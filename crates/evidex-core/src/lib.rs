// crates/evidex-core/src/lib.rs
// ============================================================================
// Crate: evidex-core
// Description: Entity data model, identifiers, hashing, and trait seams.
// Purpose: Provide the backend-agnostic foundation every other Evidex crate builds on.
// ============================================================================

//! # evidex-core
//!
//! The evidence-grounded data model: [`core::Case`] down through
//! [`core::Judgment`], plus the [`core::Uid`] identifier scheme,
//! [`core::Timestamp`], canonical hashing, the stable [`error::ErrorKind`]
//! taxonomy, and the [`interfaces`] trait seams every storage, broker, and
//! provider implementation in the workspace satisfies.
//!
//! This crate contains no I/O and no policy decisions beyond the
//! structural invariants each entity documents on its own type.

pub mod core;
pub mod error;
pub mod interfaces;
