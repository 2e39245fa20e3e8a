//! In-memory event bus for tests and standalone development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::bus::{Callback, EventBus, Payload, Unsubscribe};

struct Listener {
    id: u64,
    callback: Callback,
    active: Arc<AtomicBool>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<String, Vec<Listener>>,
    history: Option<Vec<(String, Payload)>>,
}

impl Registry {
    fn remove(&mut self, event: &str, id: u64) {
        if let Some(list) = self.listeners.get_mut(event) {
            list.retain(|l| l.id != id);
            if list.is_empty() {
                self.listeners.remove(event);
            }
        }
    }
}

/// In-memory pub/sub bus.
///
/// - No IO / no async
/// - Synchronous fan-out in registration order
/// - Callbacks run without the registry lock held, so a listener may emit or
///   (un)subscribe re-entrantly
#[derive(Clone, Default)]
pub struct InMemoryEventBus {
    inner: Arc<Mutex<Registry>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus that also records every emitted event, in order.
    pub fn recording() -> Self {
        let bus = Self::default();
        lock(&bus.inner).history = Some(Vec::new());
        bus
    }

    /// Number of live listeners for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        lock(&self.inner)
            .listeners
            .get(event)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Number of live listeners across all events.
    pub fn total_listeners(&self) -> usize {
        lock(&self.inner).listeners.values().map(Vec::len).sum()
    }

    /// Recorded emissions (empty unless built with [`InMemoryEventBus::recording`]).
    pub fn history(&self) -> Vec<(String, Payload)> {
        lock(&self.inner).history.clone().unwrap_or_default()
    }

    /// Names of recorded emissions, in order.
    pub fn emitted_names(&self) -> Vec<String> {
        self.history().into_iter().map(|(name, _)| name).collect()
    }

    pub fn clear_history(&self) {
        if let Some(history) = lock(&self.inner).history.as_mut() {
            history.clear();
        }
    }
}

impl core::fmt::Debug for InMemoryEventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryEventBus")
            .field("listeners", &self.total_listeners())
            .finish()
    }
}

// A listener that panicked must not take the whole bus down with it.
fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl EventBus for InMemoryEventBus {
    fn on(&self, event: &str, callback: Callback) -> Unsubscribe {
        let active = Arc::new(AtomicBool::new(true));
        let id = {
            let mut reg = lock(&self.inner);
            reg.next_id += 1;
            let id = reg.next_id;
            reg.listeners.entry(event.to_string()).or_default().push(Listener {
                id,
                callback,
                active: active.clone(),
            });
            id
        };

        let registry: Weak<Mutex<Registry>> = Arc::downgrade(&self.inner);
        let event = event.to_string();
        Unsubscribe::new(move || {
            active.store(false, Ordering::Release);
            if let Some(registry) = registry.upgrade() {
                lock(&registry).remove(&event, id);
            }
        })
    }

    fn off(&self, event: &str, callback: &Callback) {
        let mut reg = lock(&self.inner);
        if let Some(list) = reg.listeners.get_mut(event) {
            list.retain(|l| {
                let same = Arc::ptr_eq(&l.callback, callback);
                if same {
                    l.active.store(false, Ordering::Release);
                }
                !same
            });
            if list.is_empty() {
                reg.listeners.remove(event);
            }
        }
    }

    fn emit(&self, event: &str, payload: Payload) {
        let targets: Vec<(Callback, Arc<AtomicBool>)> = {
            let mut reg = lock(&self.inner);
            if let Some(history) = reg.history.as_mut() {
                history.push((event.to_string(), payload.clone()));
            }
            reg.listeners
                .get(event)
                .map(|list| {
                    list.iter()
                        .map(|l| (l.callback.clone(), l.active.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };

        for (callback, active) in targets {
            // Re-checked per listener: an earlier listener may have unsubscribed it.
            if active.load(Ordering::Acquire) {
                callback(&payload);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::callback;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, Callback) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        (
            hits,
            callback(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn delivers_to_every_listener_of_the_event_only() {
        let bus = InMemoryEventBus::new();
        let (a, cb_a) = counter();
        let (b, cb_b) = counter();
        let _ua = bus.on("x", cb_a);
        let _ub = bus.on("y", cb_b);

        bus.emit("x", Payload::empty());
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_stops_delivery_and_frees_the_slot() {
        let bus = InMemoryEventBus::new();
        let (hits, cb) = counter();
        let handle = bus.on("x", cb);
        assert_eq!(bus.listener_count("x"), 1);

        handle.unsubscribe();
        bus.emit("x", Payload::empty());

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(bus.total_listeners(), 0);
    }

    #[test]
    fn off_removes_by_callback_identity() {
        let bus = InMemoryEventBus::new();
        let (hits, cb) = counter();
        let (_other_hits, other) = counter();
        let _u1 = bus.on("x", cb.clone());
        let _u2 = bus.on("x", other);

        bus.off("x", &cb);
        bus.emit("x", Payload::empty());

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(bus.listener_count("x"), 1);
    }

    #[test]
    fn listener_unsubscribed_mid_emit_is_not_invoked() {
        let bus = InMemoryEventBus::new();
        let (hits, victim) = counter();

        let slot: Arc<Mutex<Option<Unsubscribe>>> = Arc::new(Mutex::new(None));
        let s = slot.clone();
        let _killer = bus.on(
            "x",
            callback(move |_| {
                if let Some(handle) = s.lock().unwrap().take() {
                    handle.unsubscribe();
                }
            }),
        );
        *slot.lock().unwrap() = Some(bus.on("x", victim));

        bus.emit("x", Payload::empty());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listeners_may_emit_reentrantly() {
        let bus = InMemoryEventBus::recording();
        let responder = bus.clone();
        let _u = bus.on(
            "micro:request-auth",
            callback(move |_| {
                responder.emit(
                    "shell:auth-change",
                    Payload::Json(json!({ "isAuthenticated": false })),
                );
            }),
        );

        bus.emit("micro:request-auth", Payload::empty());
        assert_eq!(
            bus.emitted_names(),
            vec!["micro:request-auth".to_string(), "shell:auth-change".to_string()]
        );
    }

    #[test]
    fn unsubscribe_after_bus_dropped_is_harmless() {
        let bus = InMemoryEventBus::new();
        let (_hits, cb) = counter();
        let handle = bus.on("x", cb);
        drop(bus);
        handle.unsubscribe();
    }
}
