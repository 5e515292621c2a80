// crates/evidex-ingest/src/chunker.rs
// ============================================================================
// Module: Chunker
// Description: Splits parsed document text into overlapping, anchored spans.
// Purpose: Produce the ordered Chunk spans ingestion persists.
// Dependencies: evidex-core::core::chunk
// ============================================================================

//! ## Overview
//! [`chunk_text`] splits a document's plaintext into ordinal, overlapping
//! character spans (default 2000 chars, 200 char overlap).
//! [`anchor_set_for`] derives a [`AnchorSet`] per span: a
//! [`Anchor::TextQuote`] with surrounding context and a
//! [`Anchor::TextPosition`] character range, giving every chunk at least one
//! relocation strategy even absent structural (HTML/page) metadata.

// ============================================================================
// SECTION: Imports
// ============================================================================

use evidex_core::core::chunk::Anchor;
use evidex_core::core::chunk::AnchorSet;

/// Default maximum characters per chunk.
pub const DEFAULT_MAX_CHARS: usize = 2000;
/// Default character overlap between consecutive chunks.
pub const DEFAULT_OVERLAP: usize = 200;
/// Characters of surrounding context captured in a chunk's text-quote anchor.
pub const ANCHOR_CONTEXT_CHARS: usize = 32;

/// One ordinal span produced by [`chunk_text`], in character (not byte)
/// offsets into the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpan {
    /// Zero-based ordinal position among the spans [`chunk_text`] produced.
    pub ordinal: u32,
    /// The span's text.
    pub text: String,
    /// Inclusive start character offset within the source text.
    pub start_char: usize,
    /// Exclusive end character offset within the source text.
    pub end_char: usize,
}

/// Splits `text` into ordered, overlapping character spans of at most
/// `max_chars` characters, advancing by `max_chars - overlap` characters
/// between spans. Returns no spans for empty text.
///
/// `overlap` is clamped below `max_chars` so the cursor always advances.
#[must_use]
pub fn chunk_text(text: &str, max_chars: usize, overlap: usize) -> Vec<ChunkSpan> {
    if text.is_empty() || max_chars == 0 {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    let overlap = overlap.min(max_chars.saturating_sub(1));
    let step = (max_chars - overlap).max(1);

    let mut spans = Vec::new();
    let mut start = 0usize;
    let mut ordinal = 0u32;
    while start < chars.len() {
        let end = (start + max_chars).min(chars.len());
        spans.push(ChunkSpan {
            ordinal,
            text: chars[start..end].iter().collect(),
            start_char: start,
            end_char: end,
        });
        ordinal += 1;
        if end == chars.len() {
            break;
        }
        start += step;
    }
    spans
}

/// Builds the [`AnchorSet`] for `span`, drawn from the same `source_text`
/// passed to [`chunk_text`].
#[must_use]
pub fn anchor_set_for(source_text: &str, span: &ChunkSpan) -> AnchorSet {
    let chars: Vec<char> = source_text.chars().collect();
    let prefix_start = span.start_char.saturating_sub(ANCHOR_CONTEXT_CHARS);
    let prefix: String = chars[prefix_start..span.start_char].iter().collect();
    let suffix_end = (span.end_char + ANCHOR_CONTEXT_CHARS).min(chars.len());
    let suffix: String = chars[span.end_char..suffix_end].iter().collect();

    AnchorSet {
        anchors: vec![
            Anchor::TextQuote { exact: span.text.clone(), prefix, suffix },
            Anchor::TextPosition { start: span.start_char as u64, end: span.end_char as u64 },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_no_spans() {
        assert!(chunk_text("", DEFAULT_MAX_CHARS, DEFAULT_OVERLAP).is_empty());
    }

    #[test]
    fn short_text_is_a_single_span() {
        let spans = chunk_text("hello world", DEFAULT_MAX_CHARS, DEFAULT_OVERLAP);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "hello world");
        assert_eq!(spans[0].ordinal, 0);
    }

    #[test]
    fn long_text_splits_with_overlap() {
        let text = "a".repeat(5000);
        let spans = chunk_text(&text, 2000, 200);
        assert!(spans.len() >= 3);
        for window in spans.windows(2) {
            assert!(window[1].start_char < window[0].end_char, "consecutive spans must overlap");
        }
        assert_eq!(spans.last().expect("last span").end_char, 5000);
    }

    #[test]
    fn ordinals_are_sequential() {
        let text = "b".repeat(5000);
        let spans = chunk_text(&text, 2000, 200);
        for (i, span) in spans.iter().enumerate() {
            assert_eq!(span.ordinal, u32::try_from(i).expect("ordinal fits u32"));
        }
    }

    #[test]
    fn anchor_set_captures_surrounding_context() {
        let text = "prefix context here. EXACT QUOTE. suffix context follows.";
        let spans = chunk_text(text, 13, 0);
        let quote_span = spans.iter().find(|s| s.text.contains("EXACT")).expect("quote span");
        let anchors = anchor_set_for(text, quote_span);
        let Anchor::TextQuote { exact, prefix, suffix } = &anchors.anchors[0] else {
            unreachable!("first anchor is always a text-quote anchor")
        };
        assert_eq!(exact, &quote_span.text);
        assert!(!prefix.is_empty() || quote_span.start_char == 0);
        assert!(!suffix.is_empty() || quote_span.end_char == text.chars().count());
    }
}
