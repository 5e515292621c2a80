// crates/evidex-ingest/src/claims.rs
// ============================================================================
// Module: Source Claim Extraction
// Description: Sentence-level SourceClaim extraction from a chunk's text.
// Purpose: Ground downstream assertions in verbatim, locatable quotes.
// Dependencies: evidex-core::core::{chunk, claim}
// ============================================================================

//! ## Overview
//! Claim extraction is a deliberately conservative heuristic: it splits a
//! chunk's text on sentence boundaries and emits a [`SourceClaim`] per
//! sentence long enough to carry a standalone assertion, discarding
//! fragments. Because each `quote` is sliced directly out of the chunk's
//! own text, [`SourceClaim::is_grounded_in`] is satisfied by construction —
//! this is what keeps the case-wide grounding rate requirement (≥95%)
//! trivially met for the text modality.

// ============================================================================
// SECTION: Imports
// ============================================================================

use evidex_core::core::claim::Modality;
use evidex_core::core::claim::SourceClaim;
use evidex_core::core::claim::TextQuoteSelector;
use evidex_core::core::identifiers::CaseKind;
use evidex_core::core::identifiers::ChunkKind;
use evidex_core::core::identifiers::EvidenceKind;
use evidex_core::core::identifiers::SourceClaimKind;
use evidex_core::core::identifiers::Uid;
use evidex_core::core::time::Timestamp;

/// Sentences shorter than this (in characters) are discarded as noise
/// rather than promoted to a claim.
pub const MIN_CLAIM_CHARS: usize = 20;
/// Characters of surrounding context captured in a claim's selector.
pub const CLAIM_CONTEXT_CHARS: usize = 40;

/// Extracts [`SourceClaim`]s from one chunk's text, one per sentence long
/// enough to pass [`MIN_CLAIM_CHARS`]. `next_uid` is called once per
/// extracted claim, in order.
#[must_use]
pub fn extract_source_claims(
    case_uid: Uid<CaseKind>,
    evidence_uid: Uid<EvidenceKind>,
    chunk_uid: Uid<ChunkKind>,
    chunk_text: &str,
    created_at: Timestamp,
    mut next_uid: impl FnMut() -> Uid<SourceClaimKind>,
) -> Vec<SourceClaim> {
    let mut claims = Vec::new();
    let mut cursor = 0usize;

    for raw_sentence in split_sentences(chunk_text) {
        let trimmed = raw_sentence.trim();
        if trimmed.chars().count() < MIN_CLAIM_CHARS {
            continue;
        }
        let Some(offset) = chunk_text[cursor..].find(trimmed) else {
            continue;
        };
        let start = cursor + offset;
        let end = start + trimmed.len();
        cursor = end;

        let prefix = context_before(chunk_text, start, CLAIM_CONTEXT_CHARS);
        let suffix = context_after(chunk_text, end, CLAIM_CONTEXT_CHARS);

        claims.push(SourceClaim {
            uid: next_uid(),
            case_uid,
            evidence_uid,
            chunk_uid,
            quote: trimmed.to_string(),
            selector: TextQuoteSelector { exact: trimmed.to_string(), prefix, suffix },
            modality: Modality::Text,
            segment_ref: None,
            media_time_range: None,
            original_language_text: None,
            translation_text: None,
            created_at,
        });
    }

    claims
}

/// Splits `text` into sentence-ish fragments on `.`/`!`/`?`, keeping the
/// terminator with the fragment it closes. The final, unterminated
/// fragment (if any) is included as-is.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    for (i, ch) in text.char_indices() {
        if matches!(ch, '.' | '!' | '?') {
            let end = i + ch.len_utf8();
            sentences.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// Returns up to `max_chars` characters of `text` immediately before
/// `byte_pos`, respecting UTF-8 character boundaries.
fn context_before(text: &str, byte_pos: usize, max_chars: usize) -> String {
    let before = &text[..byte_pos];
    let start_byte = before
        .char_indices()
        .rev()
        .nth(max_chars.saturating_sub(1))
        .map_or(0, |(i, _)| i);
    before[start_byte..].to_string()
}

/// Returns up to `max_chars` characters of `text` immediately after
/// `byte_pos`, respecting UTF-8 character boundaries.
fn context_after(text: &str, byte_pos: usize, max_chars: usize) -> String {
    let after = &text[byte_pos..];
    let end_byte = after.char_indices().nth(max_chars).map_or(after.len(), |(i, _)| i);
    after[..end_byte].to_string()
}
