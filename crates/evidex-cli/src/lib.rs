// crates/evidex-cli/src/lib.rs
// ============================================================================
// Module: Evidex CLI Library
// Description: Shared helpers for the Evidex command-line interface.
// Purpose: Provide reusable components (i18n, bind policy) for the CLI
//          binary and its tests.
// Dependencies: Standard library.
// ============================================================================

//! ## Overview
//! This library module houses shared CLI utilities, including the
//! internationalized message catalog. The binary entry point
//! (`src/main.rs`) imports these helpers to keep all user-facing output
//! consistent.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Internationalization helpers and message catalog.
pub mod i18n;

/// CLI server bind policy helpers.
pub mod serve_policy;
