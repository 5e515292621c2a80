// crates/evidex-config/src/docs.rs
// ============================================================================
// Module: Config Docs Generator
// Description: Markdown generator for evidex.toml documentation.
// Purpose: Keep config docs in sync with the schema and the example.
// Dependencies: serde_json, std
// ============================================================================

//! ## Overview
//! Generates `Docs/configuration/evidex.toml.md` from the canonical schema
//! and example. Deterministic: two calls with the same inputs produce byte
//! identical output, which [`verify_config_docs`] relies on to detect drift.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::examples::config_toml_example;
use crate::schema::config_schema;

/// Default output path for generated configuration docs.
pub const DOCS_PATH: &str = "Docs/configuration/evidex.toml.md";

/// Errors raised while generating or verifying config docs.
#[derive(Debug, Error)]
pub enum DocsError {
    /// I/O failure while reading or writing docs.
    #[error("docs io error: {0}")]
    Io(#[from] std::io::Error),
    /// Generated docs do not match the committed file.
    #[error("docs drift: generated output does not match {path}")]
    Drift {
        /// Path that was checked.
        path: String,
    },
}

/// Renders the configuration documentation markdown.
#[must_use]
pub fn config_docs_markdown() -> String {
    let schema = config_schema();
    let mut out = String::new();
    let _ = writeln!(out, "# `evidex.toml` configuration reference");
    let _ = writeln!(out);
    let _ = writeln!(out, "Top-level sections:");
    let _ = writeln!(out);
    if let Some(properties) = schema["properties"].as_object() {
        for (name, value) in properties {
            let required = schema["required"]
                .as_array()
                .is_some_and(|required| required.iter().any(|v| v == name));
            let marker = if required { "required" } else { "optional" };
            let _ = writeln!(out, "- `{name}` ({marker}): {value}");
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "## Example");
    let _ = writeln!(out);
    let _ = writeln!(out, "```toml");
    let _ = write!(out, "{}", config_toml_example());
    let _ = writeln!(out, "```");
    out
}

/// Writes the configuration documentation to `path`.
///
/// # Errors
///
/// Returns [`DocsError::Io`] if the file cannot be written.
pub fn write_config_docs(path: &Path) -> Result<(), DocsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, config_docs_markdown())?;
    Ok(())
}

/// Verifies that the committed docs at `path` match freshly generated docs.
///
/// # Errors
///
/// Returns [`DocsError::Io`] if `path` cannot be read, or
/// [`DocsError::Drift`] if the committed content does not match.
pub fn verify_config_docs(path: &Path) -> Result<(), DocsError> {
    let committed = fs::read_to_string(path)?;
    if committed != config_docs_markdown() {
        return Err(DocsError::Drift {
            path: path.display().to_string(),
        });
    }
    Ok(())
}
