//! Named-event publish/subscribe channel.
//!
//! An [`EventBus`] carries one payload type and routes each emission to the
//! subscribers registered under the emitted name. Each table owns its own
//! bus, so two tables never see each other's events.
//!
//! Internally every event name maps to a [`Signal`], which gives the bus the
//! same re-entrancy guarantees: a handler may emit further events or
//! subscribe new handlers while it runs.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use tablekit_core::EventBus;
//!
//! let bus = EventBus::<String>::new();
//! let log = Arc::new(Mutex::new(Vec::new()));
//!
//! let log_clone = log.clone();
//! bus.on_event("filter", move |text| log_clone.lock().push(text.clone()));
//!
//! bus.emit("filter", "quality > 0.5".to_string());
//! bus.emit("sort", "ignored".to_string());
//!
//! assert_eq!(*log.lock(), vec!["quality > 0.5".to_string()]);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::logging::targets;
use crate::signal::{ConnectionGuard, ConnectionId, Signal};

/// A per-instance event channel keyed by event name.
pub struct EventBus<P> {
    channels: Mutex<HashMap<String, Arc<Signal<P>>>>,
    blocked: AtomicBool,
}

impl<P: Send + 'static> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Send + 'static> EventBus<P> {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Returns the signal backing `name`, creating it if needed.
    pub fn channel(&self, name: &str) -> Arc<Signal<P>> {
        self.channels
            .lock()
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(Signal::new()))
            .clone()
    }

    /// Register `callback` for every emission of `name`.
    pub fn on_event<F>(&self, name: &str, callback: F) -> ConnectionId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        tracing::debug!(target: targets::EVENT_BUS, event = name, "subscriber added");
        self.channel(name).connect(callback)
    }

    /// Register `callback` until the returned guard is dropped.
    pub fn on_event_scoped<F>(&self, name: &str, callback: F) -> ConnectionGuard<P>
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.channel(name).connect_scoped(callback)
    }

    /// Remove a subscriber. Returns `false` if it was not registered.
    pub fn off(&self, name: &str, id: ConnectionId) -> bool {
        let channel = self.channels.lock().get(name).cloned();
        channel.is_some_and(|signal| signal.disconnect(id))
    }

    /// Number of subscribers currently registered for `name`.
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.channels
            .lock()
            .get(name)
            .map_or(0, |signal| signal.connection_count())
    }

    /// Suppress all emissions while `blocked` is true.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Whether emissions are currently suppressed.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Deliver `payload` to every subscriber of `name`.
    ///
    /// The channel map lock is released before any subscriber runs.
    #[tracing::instrument(skip(self, payload), target = "tablekit_core::event_bus", level = "trace")]
    pub fn emit(&self, name: &str, payload: P) {
        if self.is_blocked() {
            tracing::trace!(target: targets::EVENT_BUS, "bus blocked, dropping event");
            return;
        }

        let channel = self.channels.lock().get(name).cloned();
        match channel {
            Some(signal) => signal.emit(payload),
            None => {
                tracing::trace!(target: targets::EVENT_BUS, "no subscribers");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_emit_routes_by_name() {
        let bus = EventBus::<i64>::new();
        let selects = Arc::new(Mutex::new(Vec::new()));
        let sorts = Arc::new(AtomicUsize::new(0));

        let selects_clone = selects.clone();
        bus.on_event("select", move |&id| selects_clone.lock().push(id));
        let sorts_clone = sorts.clone();
        bus.on_event("table_sort", move |_| {
            sorts_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit("select", 7);
        bus.emit("select", 9);
        bus.emit("unknown", 1);

        assert_eq!(*selects.lock(), vec![7, 9]);
        assert_eq!(sorts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_every_subscriber_called_once() {
        let bus = EventBus::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let count = count.clone();
            bus.on_event("select", move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        bus.emit("select", ());
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(bus.subscriber_count("select"), 3);
        assert_eq!(bus.subscriber_count("missing"), 0);
    }

    #[test]
    fn test_off_and_scoped() {
        let bus = EventBus::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        let id = bus.on_event("select", move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert!(bus.off("select", id));
        assert!(!bus.off("select", id));
        assert!(!bus.off("never", id));

        {
            let count_clone = count.clone();
            let _guard = bus.on_event_scoped("select", move |_| {
                count_clone.fetch_add(10, Ordering::SeqCst);
            });
            bus.emit("select", ());
        }
        bus.emit("select", ());

        assert_eq!(count.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_instances_are_isolated() {
        let a = EventBus::<()>::new();
        let b = EventBus::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        a.on_event("select", move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        b.emit("select", ());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_blocked_bus_drops_events() {
        let bus = EventBus::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        bus.on_event("select", move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.set_blocked(true);
        bus.emit("select", ());
        bus.set_blocked(false);
        bus.emit("select", ());

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reentrant_emit_across_names() {
        let bus = Arc::new(EventBus::<u32>::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&bus);
        bus.on_event("sortComplete", move |&n| {
            if let Some(bus) = weak.upgrade() {
                bus.emit("table_sort", n * 10);
            }
        });
        let seen_clone = seen.clone();
        bus.on_event("table_sort", move |&n| seen_clone.lock().push(n));

        bus.emit("sortComplete", 4);
        assert_eq!(*seen.lock(), vec![40]);
    }
}
