// crates/evidex-events/src/bus.rs
// ============================================================================
// Module: Event Bus
// Description: In-process fire-and-forget publish/subscribe with wildcard matching.
// Purpose: Fan pipeline/tool/ingestion events out to the Notification/Progress layer.
// Dependencies: evidex-core, parking_lot, tokio, tracing
// ============================================================================

//! ## Overview
//! The Event Bus keeps a handler registry behind a read-biased
//! [`parking_lot::RwLock`] (spec §5's shared-resource policy) and dispatches
//! [`emit`](EventBus::emit) fire-and-forget: each matching handler runs on
//! its own spawned task, and a panicking handler is caught, logged with its
//! event type and name, and never propagates. `event_type = "*"` matches
//! every event. Within one `event_type`, handlers registered earlier run
//! first (FIFO); the bus makes no ordering guarantee across event types.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use parking_lot::RwLock;
use tokio::task::JoinHandle;

use crate::event::Event;
use crate::event::WILDCARD_EVENT_TYPE;

/// A boxed, `'static`, `Send` future, the shape every handler returns.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A registered event handler: given an [`Event`], returns a future that
/// resolves when the handler has finished reacting to it.
pub type Handler = Arc<dyn Fn(Event) -> BoxFuture<()> + Send + Sync>;

struct Registration {
    name: String,
    handler: Handler,
}

/// In-process publish/subscribe bus. See spec §4.9.
///
/// # Invariants
/// - A handler's panic is caught and logged; it never propagates to the
///   publisher of [`EventBus::emit`].
/// - [`EventBus::drain`] waits for every handler task spawned by `emit`
///   calls made before it, including ones still finishing when `drain` is
///   called.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<String, Vec<Registration>>>,
    inflight: Mutex<Vec<JoinHandle<()>>>,
}

impl EventBus {
    /// Builds an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name` for `event_type`
    /// ([`WILDCARD_EVENT_TYPE`] matches every event). Handlers registered
    /// earlier for the same `event_type` run before later ones.
    pub fn on(&self, event_type: impl Into<String>, name: impl Into<String>, handler: Handler) {
        let mut handlers = self.handlers.write();
        handlers
            .entry(event_type.into())
            .or_default()
            .push(Registration { name: name.into(), handler });
    }

    /// Collects the handlers that match `event_type`: exact-type handlers
    /// (in registration order), followed by wildcard handlers (in
    /// registration order).
    fn matching(&self, event_type: &str) -> Vec<(String, Handler)> {
        let handlers = self.handlers.read();
        let mut matched = Vec::new();
        if let Some(exact) = handlers.get(event_type) {
            matched.extend(exact.iter().map(|r| (r.name.clone(), Arc::clone(&r.handler))));
        }
        if event_type != WILDCARD_EVENT_TYPE {
            if let Some(wildcard) = handlers.get(WILDCARD_EVENT_TYPE) {
                matched.extend(wildcard.iter().map(|r| (r.name.clone(), Arc::clone(&r.handler))));
            }
        }
        matched
    }

    /// Dispatches `event` fire-and-forget: every matching handler is
    /// scheduled on its own task. Handler panics are caught and logged,
    /// never propagated to the caller.
    pub fn emit(&self, event: Event) {
        for (name, handler) in self.matching(&event.event_type) {
            let event_type = event.event_type.clone();
            let event_clone = event.clone();
            let inner = tokio::spawn(async move { handler(event_clone).await });
            let supervisor = tokio::spawn(async move {
                if let Err(join_err) = inner.await {
                    tracing::error!(
                        event_type = %event_type,
                        handler = %name,
                        error = %join_err,
                        "event handler panicked",
                    );
                }
            });
            self.inflight.lock().push(supervisor);
        }
    }

    /// Dispatches `event` and awaits every matching handler before
    /// returning. Intended for tests that need deterministic completion
    /// rather than the fire-and-forget semantics of [`EventBus::emit`].
    pub async fn emit_and_wait(&self, event: Event) {
        for (name, handler) in self.matching(&event.event_type) {
            let event_type = event.event_type.clone();
            let event_clone = event.clone();
            if let Err(join_err) = tokio::spawn(async move { handler(event_clone).await }).await {
                tracing::error!(
                    event_type = %event_type,
                    handler = %name,
                    error = %join_err,
                    "event handler panicked",
                );
            }
        }
    }

    /// Awaits every handler task spawned by `emit` up to this point, for
    /// graceful shutdown.
    pub async fn drain(&self) {
        let handles = std::mem::take(&mut *self.inflight.lock());
        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::event::Event;

    fn ts() -> evidex_core::core::Timestamp {
        "2026-01-01T00:00:00Z".parse().expect("ts")
    }

    fn counting_handler(counter: Arc<AtomicUsize>) -> Handler {
        Arc::new(move |_event| {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[tokio::test]
    async fn wildcard_handler_receives_every_event_type() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.on(WILDCARD_EVENT_TYPE, "counter", counting_handler(Arc::clone(&counter)));

        bus.emit_and_wait(Event::new("artifact.ingested", serde_json::json!({}), None, ts())).await;
        bus.emit_and_wait(Event::new("pipeline.progress", serde_json::json!({}), None, ts())).await;

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn handler_registered_for_other_type_does_not_fire() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.on("pipeline.progress", "counter", counting_handler(Arc::clone(&counter)));

        bus.emit_and_wait(Event::new("artifact.ingested", serde_json::json!({}), None, ts())).await;

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fifo_order_within_one_event_type() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.on(
                "pipeline.progress",
                label,
                Arc::new(move |_event| {
                    let order = Arc::clone(&order);
                    let label = label;
                    Box::pin(async move {
                        order.lock().push(label);
                    })
                }),
            );
        }
        bus.emit_and_wait(Event::new("pipeline.progress", serde_json::json!({}), None, ts())).await;
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn panicking_handler_is_caught_and_does_not_stop_dispatch() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.on(
            "alert",
            "panics",
            Arc::new(|_event| Box::pin(async { panic!("boom") })),
        );
        bus.on("alert", "survives", counting_handler(Arc::clone(&counter)));

        bus.emit_and_wait(Event::new("alert", serde_json::json!({}), None, ts())).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn emit_is_fire_and_forget_and_drain_awaits_it() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.on("alert", "counter", counting_handler(Arc::clone(&counter)));

        bus.emit(Event::new("alert", serde_json::json!({}), None, ts()));
        bus.drain().await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
