// ── Lifecycle event bus ──
//
// Named events (`node_added`, `value_changed`, ...) dispatched
// synchronously to listeners in registration order. The registry is
// shared by every entity of one manager instance.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use serde_json::Value;

use crate::store::EntityRef;

// ── Event names ──────────────────────────────────────────────────────

pub const EVENT_INSTANCE_ADDED: &str = "instance_added";
pub const EVENT_INSTANCE_CHANGED: &str = "instance_changed";
pub const EVENT_INSTANCE_REMOVED: &str = "instance_removed";
pub const EVENT_INSTANCE_EVENT: &str = "instance_event";
pub const EVENT_INSTANCE_STATUS_CHANGED: &str = "instance_status_changed";
pub const EVENT_INSTANCE_STATISTICS_CHANGED: &str = "instance_statistics_changed";
pub const EVENT_NODE_ADDED: &str = "node_added";
pub const EVENT_NODE_CHANGED: &str = "node_changed";
pub const EVENT_NODE_REMOVED: &str = "node_removed";
pub const EVENT_NODE_STATISTICS_CHANGED: &str = "node_statistics_changed";
pub const EVENT_NODE_INSTANCE_ADDED: &str = "node_instance_added";
pub const EVENT_NODE_INSTANCE_CHANGED: &str = "node_instance_changed";
pub const EVENT_NODE_INSTANCE_REMOVED: &str = "node_instance_removed";
pub const EVENT_NODE_ASSOCIATION_ADDED: &str = "node_association_added";
pub const EVENT_NODE_ASSOCIATION_CHANGED: &str = "node_association_changed";
pub const EVENT_NODE_ASSOCIATION_REMOVED: &str = "node_association_removed";
pub const EVENT_COMMAND_CLASS_ADDED: &str = "command_class_added";
pub const EVENT_COMMAND_CLASS_CHANGED: &str = "command_class_changed";
pub const EVENT_COMMAND_CLASS_REMOVED: &str = "command_class_removed";
pub const EVENT_VALUE_ADDED: &str = "value_added";
pub const EVENT_VALUE_CHANGED: &str = "value_changed";
pub const EVENT_VALUE_REMOVED: &str = "value_removed";

/// Every event the Z-Wave model can emit.
pub const ALL_EVENTS: &[&str] = &[
    EVENT_INSTANCE_ADDED,
    EVENT_INSTANCE_CHANGED,
    EVENT_INSTANCE_REMOVED,
    EVENT_INSTANCE_EVENT,
    EVENT_INSTANCE_STATUS_CHANGED,
    EVENT_INSTANCE_STATISTICS_CHANGED,
    EVENT_NODE_ADDED,
    EVENT_NODE_CHANGED,
    EVENT_NODE_REMOVED,
    EVENT_NODE_STATISTICS_CHANGED,
    EVENT_NODE_INSTANCE_ADDED,
    EVENT_NODE_INSTANCE_CHANGED,
    EVENT_NODE_INSTANCE_REMOVED,
    EVENT_NODE_ASSOCIATION_ADDED,
    EVENT_NODE_ASSOCIATION_CHANGED,
    EVENT_NODE_ASSOCIATION_REMOVED,
    EVENT_COMMAND_CLASS_ADDED,
    EVENT_COMMAND_CLASS_CHANGED,
    EVENT_COMMAND_CLASS_REMOVED,
    EVENT_VALUE_ADDED,
    EVENT_VALUE_CHANGED,
    EVENT_VALUE_REMOVED,
];

// ── EventPayload ─────────────────────────────────────────────────────

/// Data handed to a listener.
///
/// Lifecycle events carry the entity itself, borrowed from the tree for
/// the duration of the call. Forwarded daemon events carry a raw record.
#[derive(Debug, Clone, Copy)]
pub enum EventPayload<'a> {
    Entity(EntityRef<'a>),
    Record(&'a Value),
}

impl<'a> EventPayload<'a> {
    pub fn entity(&self) -> Option<EntityRef<'a>> {
        match self {
            Self::Entity(entity) => Some(*entity),
            Self::Record(_) => None,
        }
    }

    pub fn record(&self) -> Option<&'a Value> {
        match self {
            Self::Record(value) => Some(value),
            Self::Entity(_) => None,
        }
    }
}

/// A registered callback.
pub type Listener = Arc<dyn Fn(&EventPayload<'_>) + Send + Sync>;

// ── EventBus ─────────────────────────────────────────────────────────

/// Registry mapping event names to ordered listener lists.
///
/// Cheaply cloneable; clones share the same registry. Dispatch is
/// synchronous and does not isolate listeners: a panic in one listener
/// propagates to the caller and later listeners are not invoked.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

#[derive(Default)]
struct BusInner {
    listeners: DashMap<String, Vec<(u64, Listener)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `event`. Registering the same closure twice
    /// yields two independent registrations.
    pub fn listen<F>(&self, event: &str, listener: F) -> Subscription
    where
        F: Fn(&EventPayload<'_>) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .entry(event.to_owned())
            .or_default()
            .push((id, Arc::new(listener)));

        Subscription {
            bus: Arc::downgrade(&self.inner),
            event: event.to_owned(),
            id,
        }
    }

    /// Invoke every listener currently registered for `event`.
    ///
    /// The listener list is copied out of the registry before dispatch, so
    /// listeners may subscribe or unsubscribe while being called; such
    /// changes take effect from the next `notify`.
    pub fn notify(&self, event: &str, payload: &EventPayload<'_>) {
        let listeners: Vec<Listener> = match self.inner.listeners.get(event) {
            Some(entry) => entry.iter().map(|(_, l)| Arc::clone(l)).collect(),
            None => return,
        };

        tracing::trace!(event, listeners = listeners.len(), "dispatching event");
        for listener in listeners {
            listener(payload);
        }
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.listeners.get(event).map_or(0, |entry| entry.len())
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("events", &self.inner.listeners.len())
            .finish()
    }
}

// ── Subscription ─────────────────────────────────────────────────────

/// Capability to remove exactly one registration.
///
/// Dropping it leaves the listener registered.
#[derive(Debug)]
#[must_use = "dropping a Subscription keeps the listener registered forever"]
pub struct Subscription {
    bus: Weak<BusInner>,
    event: String,
    id: u64,
}

impl Subscription {
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Remove the registration. Returns `false` if it was already gone
    /// (or the bus was dropped).
    pub fn unsubscribe(self) -> bool {
        let Some(bus) = self.bus.upgrade() else {
            return false;
        };
        let Some(mut entry) = bus.listeners.get_mut(&self.event) else {
            return false;
        };
        let before = entry.len();
        entry.retain(|(id, _)| *id != self.id);
        before != entry.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&EventPayload<'_>) + Send + Sync>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let make = {
            let log = Arc::clone(&log);
            move |tag: &str| -> Box<dyn Fn(&EventPayload<'_>) + Send + Sync> {
                let log = Arc::clone(&log);
                let tag = tag.to_owned();
                Box::new(move |_: &EventPayload<'_>| log.lock().unwrap().push(tag.clone()))
            }
        };
        (log, make)
    }

    #[test]
    fn listeners_fire_in_registration_order() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let _a = bus.listen("ev", make("a"));
        let _b = bus.listen("ev", make("b"));
        let _c = bus.listen("ev", make("c"));

        bus.notify("ev", &EventPayload::Record(&json!({})));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn unknown_event_is_a_noop() {
        let bus = EventBus::new();
        bus.notify("nobody_listens", &EventPayload::Record(&json!({})));
        assert_eq!(bus.listener_count("nobody_listens"), 0);
    }

    #[test]
    fn no_deduplication() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicU64::new(0));
        for _ in 0..2 {
            let count = Arc::clone(&count);
            let _ = bus.listen("ev", move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        bus.notify("ev", &EventPayload::Record(&json!({})));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_removes_only_that_registration() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let a = bus.listen("ev", make("a"));
        let _b = bus.listen("ev", make("b"));

        assert!(a.unsubscribe());
        bus.notify("ev", &EventPayload::Record(&json!({})));
        assert_eq!(*log.lock().unwrap(), vec!["b"]);
        assert_eq!(bus.listener_count("ev"), 1);
    }

    #[test]
    fn record_payload_reaches_listener() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let _s = bus.listen("ev", move |payload| {
            *sink.lock().unwrap() = payload.record().cloned();
        });
        bus.notify("ev", &EventPayload::Record(&json!({"k": 1})));
        assert_eq!(*seen.lock().unwrap(), Some(json!({"k": 1})));
    }

    #[test]
    fn listener_may_subscribe_during_dispatch() {
        let bus = EventBus::new();
        let inner_bus = bus.clone();
        let _s = bus.listen("ev", move |_| {
            let _ = inner_bus.listen("ev", |_| {});
        });
        bus.notify("ev", &EventPayload::Record(&json!({})));
        assert_eq!(bus.listener_count("ev"), 2);
    }
}
