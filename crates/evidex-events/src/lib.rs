// crates/evidex-events/src/lib.rs
// ============================================================================
// Crate: evidex-events
// Description: In-process Event Bus fanning pipeline/tool/ingestion activity
//              out to notification and progress subscribers.
// ============================================================================

//! Evidex's Event Bus (spec §4.9): a fire-and-forget, in-process
//! publish/subscribe mechanism. Producers call [`EventBus::emit`] with an
//! [`Event`]; subscribers register with [`EventBus::on`], optionally under
//! the [`WILDCARD_EVENT_TYPE`] to receive every event. Handler panics are
//! caught and logged, never propagated to the publisher.
//!
//! The [`notify`] module layers a per-user Notification/Progress channel
//! (spec §4.12) on top: event handlers registered on the bus are the
//! typical way a [`notify::NotificationHub`] gets fed.

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod bus;
pub mod event;
pub mod notify;

pub use bus::BoxFuture;
pub use bus::EventBus;
pub use bus::Handler;
pub use event::Event;
pub use event::WILDCARD_EVENT_TYPE;
pub use notify::NotificationHub;
pub use notify::Sink;
pub use notify::SinkError;
