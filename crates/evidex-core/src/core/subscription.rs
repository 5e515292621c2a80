// crates/evidex-core/src/core/subscription.rs
// ============================================================================
// Module: Subscription, EventLog, PushLog
// Description: User-scoped interest rules, canonicalized incoming events, and delivery audit.
// Purpose: Let a user register interest once and get a traceable record of every notification.
// Dependencies: crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! A [`Subscription`] is a user-scoped interest rule matched against
//! incoming events. An [`EventLog`] is one canonicalized incoming event,
//! deduped by `source_event_uid`. A [`PushLog`] records one delivery
//! attempt to a notification sink.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ActorId;
use crate::core::identifiers::CaseKind;
use crate::core::identifiers::EventLogKind;
use crate::core::identifiers::PushLogKind;
use crate::core::identifiers::SubscriptionKind;
use crate::core::identifiers::Uid;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Notification Kind
// ============================================================================

/// The kind of notification delivered through a push sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A generic operator alert.
    Alert,
    /// A crawler gap-fill task finished.
    CrawlerDone,
    /// A scheduled cron task produced a result.
    CronResult,
    /// Pipeline run progress changed.
    PipelineProgress,
    /// A collection/ingestion batch finished.
    CollectionDone,
}

// ============================================================================
// SECTION: Subscription
// ============================================================================

/// A user-scoped interest rule matched against incoming events.
///
/// # Invariants
/// - `event_types` is non-empty, or `match_all` is `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription uid.
    pub uid: Uid<SubscriptionKind>,
    /// Case this subscription is scoped to.
    pub case_uid: Uid<CaseKind>,
    /// User the subscription belongs to.
    pub user_id: ActorId,
    /// Notification kinds this subscription matches; ignored if
    /// `match_all` is set.
    pub event_types: Vec<NotificationKind>,
    /// Matches every notification kind, ignoring `event_types`.
    pub match_all: bool,
    /// Whether this subscription is currently active.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

impl Subscription {
    /// Returns whether this subscription matches `kind`.
    #[must_use]
    pub fn matches(&self, kind: NotificationKind) -> bool {
        self.active && (self.match_all || self.event_types.contains(&kind))
    }
}

// ============================================================================
// SECTION: EventLog
// ============================================================================

/// A canonicalized incoming event, deduped by `source_event_uid`.
///
/// # Invariants
/// - `source_event_uid` is stable across redeliveries of the same
///   upstream event; consumers dedupe on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    /// Event log uid.
    pub uid: Uid<EventLogKind>,
    /// Owning case, if the event is case-scoped.
    pub case_uid: Option<Uid<CaseKind>>,
    /// Stable identifier assigned by the originating producer, used for
    /// dedup across redeliveries.
    pub source_event_uid: String,
    /// Canonical event type, e.g. `"artifact.ingested"`.
    pub event_type: String,
    /// Canonicalized event payload.
    pub payload: Value,
    /// Time the event was recorded.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: PushLog
// ============================================================================

/// Outcome of one delivery attempt to a notification sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// The sink accepted the delivery.
    Delivered,
    /// The sink failed; the sink was deregistered as a result.
    FailedSinkDeregistered,
}

/// An audit record of one notification delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushLog {
    /// Push log uid.
    pub uid: Uid<PushLogKind>,
    /// Subscription this delivery was made on behalf of, if any (absent
    /// for `broadcast` deliveries).
    pub subscription_uid: Option<Uid<SubscriptionKind>>,
    /// User the notification was pushed to.
    pub user_id: ActorId,
    /// Notification kind delivered.
    pub kind: NotificationKind,
    /// Delivery outcome.
    pub status: DeliveryStatus,
    /// Delivery timestamp.
    pub created_at: Timestamp,
}
