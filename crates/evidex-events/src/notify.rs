// crates/evidex-events/src/notify.rs
// ============================================================================
// Module: Notification / Progress
// Description: Per-user notification channel abstraction over pluggable sinks.
// Purpose: Fan pipeline progress, crawler, cron, and alert events out to users.
// Dependencies: evidex-core, parking_lot
// ============================================================================

//! ## Overview
//! A [`NotificationHub`] keeps a per-user registry of [`Sink`] trait
//! objects behind a [`parking_lot::Mutex`] (spec §5's shared-resource
//! policy favors short critical sections over a read-biased lock here,
//! since `notify`/`broadcast` both mutate on sink failure).
//! [`NotificationHub::notify`] delivers to one user's registered sinks;
//! [`NotificationHub::broadcast`] delivers to every registered user. A sink
//! that returns [`SinkError`] on delivery is deregistered immediately —
//! "sink failures deregister the sink", verbatim.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use evidex_core::core::ActorId;
use evidex_core::core::NotificationKind;
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Sink
// ============================================================================

/// A delivery error raised by a [`Sink`] implementation.
#[derive(Debug, Error)]
#[error("notification sink failed: {0}")]
pub struct SinkError(pub String);

/// A per-user delivery channel: a WebSocket connection, an SSE stream, a
/// webhook. Implementations must not block; long-running delivery should
/// be backed by a bounded internal queue.
pub trait Sink: Send + Sync {
    /// Delivers one notification. A returned [`SinkError`] causes the hub
    /// to deregister this sink for its owning user.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when delivery fails (closed connection,
    /// full queue, transport error).
    fn send(&self, kind: NotificationKind, payload: &Value) -> Result<(), SinkError>;
}

// ============================================================================
// SECTION: NotificationHub
// ============================================================================

/// Per-user notification registry. See spec §4.12.
///
/// # Invariants
/// - A sink that fails delivery is removed from the registry before
///   [`NotificationHub::notify`] or [`NotificationHub::broadcast`] returns.
#[derive(Default)]
pub struct NotificationHub {
    sinks: Mutex<HashMap<ActorId, Vec<Arc<dyn Sink>>>>,
}

impl NotificationHub {
    /// Builds an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `sink` for `user_id`. A user may have more than one
    /// live sink (e.g. multiple open browser tabs).
    pub fn register(&self, user_id: ActorId, sink: Arc<dyn Sink>) {
        self.sinks.lock().entry(user_id).or_default().push(sink);
    }

    /// Removes every sink registered for `user_id`.
    pub fn unregister(&self, user_id: &ActorId) {
        self.sinks.lock().remove(user_id);
    }

    /// Delivers `payload` to every sink registered for `user_id`. Sinks
    /// that fail are deregistered; remaining sinks still receive the
    /// notification.
    pub fn notify(&self, user_id: &ActorId, kind: NotificationKind, payload: &Value) {
        let mut sinks = self.sinks.lock();
        let Some(user_sinks) = sinks.get_mut(user_id) else {
            return;
        };
        user_sinks.retain(|sink| match sink.send(kind, payload) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(user_id = %user_id, error = %error, "notification sink failed, deregistering");
                false
            }
        });
        if user_sinks.is_empty() {
            sinks.remove(user_id);
        }
    }

    /// Delivers `payload` to every registered user's sinks.
    pub fn broadcast(&self, kind: NotificationKind, payload: &Value) {
        let user_ids: Vec<ActorId> = self.sinks.lock().keys().cloned().collect();
        for user_id in user_ids {
            self.notify(&user_id, kind, payload);
        }
    }
}
