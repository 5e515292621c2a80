// crates/evidex-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Provides message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings for future localization support.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! The Evidex CLI stores user-facing strings in a small translation catalog
//! to enforce consistent messaging and to prepare for future locales. All
//! runtime output should be routed through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to the key itself to avoid panics.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self { key, value: value.into() }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static catalog entries loaded into the localized message bundle.
const CATALOG_ITEMS: &[(&str, &str)] = &[
    ("main.version", "evidex {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("serve.config.load_failed", "Failed to load config at {path}: {error}"),
    ("serve.bind.parse_failed", "Invalid bind address {bind}: {error}"),
    (
        "serve.bind.non_loopback",
        "Refusing to bind to non-loopback address {bind}. Set --allow-non-loopback or \
         {env}=1 to opt in.",
    ),
    (
        "serve.bind.allow_env_invalid",
        "Invalid value for {env}: {value}. Expected true/false/1/0/yes/no/on/off.",
    ),
    ("serve.warn.local_only", "Warning: binding to {bind}. Only loopback is safe without a reverse proxy."),
    ("serve.store.open_failed", "Failed to open evidence store at {path}: {error}"),
    ("serve.state.build_failed", "Failed to build server state: {error}"),
    ("serve.failed", "evidex-server failed: {error}"),
    ("case.create.failed", "Failed to create case: {error}"),
    ("case.create.ok", "Created case {case_uid} ({title})"),
    ("case.fixture.import_failed", "Failed to import fixture {fixture_name}: {error}"),
    (
        "case.fixture.import_ok",
        "Imported fixture {fixture_name} into case {case_uid}: {evidence_count} evidence, \
         {assertion_count} assertions",
    ),
    ("pipeline.run.failed", "Failed to run pipeline: {error}"),
    ("pipeline.run.ok", "Run {run_uid} is {status} ({stage_count} stages completed)"),
    ("chat.ask.failed", "Failed to answer question: {error}"),
    ("chat.ask.ok", "[{answer_type}] {answer_text}"),
    ("quality.score.failed", "Failed to score judgment: {error}"),
    (
        "quality.score.ok",
        "evidence_coverage={evidence_coverage} source_diversity={source_diversity} \
         confidence_calibration={confidence_calibration} narrative_coherence={narrative_coherence}",
    ),
    ("http.request_failed", "Request to {url} failed: {error}"),
    ("http.status_error", "Request to {url} returned {status}: {body}"),
    ("http.decode_failed", "Failed to decode response from {url}: {error}"),
];

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the English fallback catalog while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog().get(key).copied().unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

/// Returns the static English catalog used by the CLI.
fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

    CATALOG.get_or_init(|| CATALOG_ITEMS.iter().copied().collect())
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
///
/// # Returns
///
/// A localized [`String`] with placeholders substituted.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
