// crates/evidex-events/src/event.rs
// ============================================================================
// Module: Event
// Description: Immutable value type dispatched through the Event Bus.
// Purpose: Give every published event a stable, dedupe-friendly identity.
// Dependencies: evidex-core, serde_json
// ============================================================================

//! ## Overview
//! An [`Event`] is an immutable value carrying a mandatory
//! `source_event_uid`, auto-generated when the publisher leaves it blank.
//! Consumers dedupe redeliveries of the same upstream occurrence by this
//! id, mirroring [`evidex_core::core::EventLog`]'s dedup convention.

// ============================================================================
// SECTION: Imports
// ============================================================================

use evidex_core::core::EventLogKind;
use evidex_core::core::Timestamp;
use evidex_core::core::Uid;
use serde_json::Value;

/// Matches every event type, regardless of `event_type`.
pub const WILDCARD_EVENT_TYPE: &str = "*";

/// An immutable value published through the [`crate::bus::EventBus`].
///
/// # Invariants
/// - `source_event_uid` is non-empty; a blank id is replaced with a fresh
///   random one at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Stable identifier assigned by the originating producer, used by
    /// consumers to dedupe redeliveries.
    pub source_event_uid: String,
    /// Canonical event type, e.g. `"artifact.ingested"`.
    pub event_type: String,
    /// Event payload.
    pub payload: Value,
    /// Time the event was published.
    pub created_at: Timestamp,
}

impl Event {
    /// Constructs an event, generating `source_event_uid` when `source_event_uid`
    /// is empty.
    #[must_use]
    pub fn new(
        event_type: impl Into<String>,
        payload: Value,
        source_event_uid: Option<String>,
        created_at: Timestamp,
    ) -> Self {
        let source_event_uid = match source_event_uid {
            Some(id) if !id.is_empty() => id,
            _ => Uid::<EventLogKind>::random().to_wire_string(),
        };
        Self {
            source_event_uid,
            event_type: event_type.into(),
            payload,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> Timestamp {
        "2026-01-01T00:00:00Z".parse().expect("ts")
    }

    #[test]
    fn blank_source_event_uid_is_generated() {
        let event = Event::new("artifact.ingested", serde_json::json!({}), None, ts());
        assert!(!event.source_event_uid.is_empty());
    }

    #[test]
    fn supplied_source_event_uid_is_preserved() {
        let event = Event::new(
            "artifact.ingested",
            serde_json::json!({}),
            Some("producer-7".to_string()),
            ts(),
        );
        assert_eq!(event.source_event_uid, "producer-7");
    }
}
