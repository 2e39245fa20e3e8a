//! Per-mount-cycle adapter around the shell's bus.
//!
//! The bridge is the only place the module touches the shell's bus. It owns
//! every subscription made during one mount cycle and releases all of them in
//! [`EventBridge::release`] (also run on drop). A shared "live" flag guards
//! each callback body, so a delivery that races with unmount is dropped
//! instead of writing into a torn-down tree.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use microapp_core::{MountId, NotificationLevel};

use crate::bus::{Payload, SharedEventBus, Unsubscribe, callback};
use crate::event::{Direction, EventName, ModuleEvent, ShellEvent};

pub struct EventBridge {
    bus: Option<SharedEventBus>,
    cycle: MountId,
    live: Arc<AtomicBool>,
    subscriptions: Mutex<Vec<(EventName, Unsubscribe)>>,
}

impl EventBridge {
    /// Bridge for one mount cycle. A missing bus is tolerated: every
    /// operation becomes a no-op.
    pub fn new(bus: Option<SharedEventBus>, cycle: MountId) -> Self {
        if bus.is_none() {
            tracing::warn!(
                mount_id = %cycle,
                "event bus not provided in mount props; shell events are disabled"
            );
        }
        Self {
            bus,
            cycle,
            live: Arc::new(AtomicBool::new(true)),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    pub fn cycle(&self) -> MountId {
        self.cycle
    }

    pub fn is_connected(&self) -> bool {
        self.bus.is_some()
    }

    /// `false` once the cycle has been released.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub fn emit(&self, event: ModuleEvent) {
        let Some(bus) = &self.bus else {
            tracing::debug!(
                mount_id = %self.cycle,
                event = %event.name(),
                "no event bus; dropping outbound event"
            );
            return;
        };
        if !self.is_live() {
            tracing::warn!(
                mount_id = %self.cycle,
                event = %event.name(),
                "emit after unmount ignored"
            );
            return;
        }
        tracing::debug!(mount_id = %self.cycle, event = %event.name(), "emit");
        bus.emit(event.name().as_str(), event.payload());
    }

    pub fn loaded(&self, name: impl Into<String>) {
        self.emit(ModuleEvent::Loaded { name: name.into() });
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.emit(ModuleEvent::Notification {
            level,
            message: message.into(),
        });
    }

    pub fn request_auth(&self) {
        self.emit(ModuleEvent::RequestAuth);
    }

    pub fn request_api_functions(&self) {
        self.emit(ModuleEvent::RequestApiFunctions);
    }

    /// Ask the shell to navigate (outside of this module's routes).
    pub fn navigate_shell(&self, path: impl Into<String>) {
        self.emit(ModuleEvent::Navigation { path: path.into() });
    }

    /// Subscribe `handler` to a shell → module event for the rest of this cycle.
    ///
    /// Returns `false` (and registers nothing) when there is no bus, the cycle
    /// was already released, or `name` is not a shell → module event.
    pub fn subscribe<F>(&self, name: EventName, handler: F) -> bool
    where
        F: Fn(ShellEvent) + Send + Sync + 'static,
    {
        if name.direction() != Direction::ShellToModule {
            tracing::warn!(
                mount_id = %self.cycle,
                event = %name,
                "refusing to subscribe to a module → shell event"
            );
            return false;
        }
        let Some(bus) = &self.bus else {
            return false;
        };

        let mut subs = self.lock_subscriptions();
        // Checked under the lock so a concurrent release cannot miss this entry.
        if !self.is_live() {
            return false;
        }

        let live = self.live.clone();
        let cycle = self.cycle;
        let cb = callback(move |payload: &Payload| {
            if !live.load(Ordering::Acquire) {
                tracing::debug!(
                    mount_id = %cycle,
                    event = %name,
                    "late delivery after unmount ignored"
                );
                return;
            }
            match ShellEvent::decode(name, payload) {
                Ok(event) => handler(event),
                Err(err) => {
                    tracing::warn!(
                        mount_id = %cycle,
                        event = %name,
                        error = %err,
                        "malformed shell event dropped"
                    );
                }
            }
        });

        let handle = bus.on(name.as_str(), cb);
        subs.push((name, handle));
        tracing::debug!(mount_id = %cycle, event = %name, "subscribed");
        true
    }

    pub fn subscription_count(&self) -> usize {
        self.lock_subscriptions().len()
    }

    /// End the cycle: mark it dead and unsubscribe everything.
    ///
    /// Returns the number of subscriptions released. Idempotent.
    pub fn release(&self) -> usize {
        let drained: Vec<(EventName, Unsubscribe)> = {
            let mut subs = self.lock_subscriptions();
            self.live.store(false, Ordering::Release);
            subs.drain(..).collect()
        };

        let count = drained.len();
        for (name, handle) in drained {
            tracing::debug!(mount_id = %self.cycle, event = %name, "unsubscribed");
            handle.unsubscribe();
        }
        count
    }

    fn lock_subscriptions(&self) -> MutexGuard<'_, Vec<(EventName, Unsubscribe)>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for EventBridge {
    fn drop(&mut self) {
        self.release();
    }
}

impl core::fmt::Debug for EventBridge {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBridge")
            .field("cycle", &self.cycle)
            .field("connected", &self.is_connected())
            .field("live", &self.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use crate::in_memory_bus::InMemoryEventBus;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    fn bridge_on(bus: &InMemoryEventBus) -> EventBridge {
        let shared: SharedEventBus = Arc::new(bus.clone());
        EventBridge::new(Some(shared), MountId::new())
    }

    #[test]
    fn outbound_helpers_use_the_fixed_vocabulary() {
        let bus = InMemoryEventBus::recording();
        let bridge = bridge_on(&bus);

        bridge.loaded("micro-app-demo");
        bridge.notify(NotificationLevel::Info, "hello");
        bridge.request_auth();
        bridge.request_api_functions();
        bridge.navigate_shell("/dashboard");

        assert_eq!(
            bus.emitted_names(),
            vec![
                "micro:loaded",
                "shell:notification",
                "micro:request-auth",
                "micro:request-api-functions",
                "shell:navigation",
            ]
        );
        let (_, nav) = bus.history().pop().unwrap();
        assert_eq!(nav.as_json(), Some(&json!({ "path": "/dashboard" })));
    }

    #[test]
    fn release_unsubscribes_everything_it_registered() {
        let bus = InMemoryEventBus::new();
        let bridge = bridge_on(&bus);

        assert!(bridge.subscribe(EventName::AuthChange, |_| {}));
        assert!(bridge.subscribe(EventName::PathChanged, |_| {}));
        assert_eq!(bus.total_listeners(), 2);

        assert_eq!(bridge.release(), 2);
        assert_eq!(bus.total_listeners(), 0);
        assert_eq!(bridge.release(), 0);
        assert!(!bridge.is_live());
    }

    #[test]
    fn drop_releases_subscriptions() {
        let bus = InMemoryEventBus::new();
        {
            let bridge = bridge_on(&bus);
            bridge.subscribe(EventName::Navigate, |_| {});
            assert_eq!(bus.total_listeners(), 1);
        }
        assert_eq!(bus.total_listeners(), 0);
    }

    #[test]
    fn handler_receives_decoded_events_and_skips_malformed_ones() {
        let bus = InMemoryEventBus::new();
        let bridge = bridge_on(&bus);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        bridge.subscribe(EventName::Navigate, move |ev| {
            if let ShellEvent::Navigate { path } = ev {
                s.lock().unwrap().push(path);
            }
        });

        bus.emit("shell:navigate", Payload::Json(json!({ "nope": 1 })));
        bus.emit("shell:navigate", Payload::Json(json!({ "path": "/projects" })));

        assert_eq!(*seen.lock().unwrap(), vec!["/projects".to_string()]);
    }

    #[test]
    fn deliveries_captured_before_release_are_ignored_after_it() {
        // Simulates a shell that kept a reference to our callback and fires
        // it after the module unmounted.
        struct LeakyBus {
            inner: InMemoryEventBus,
            kept: Mutex<Vec<crate::bus::Callback>>,
        }
        impl EventBus for LeakyBus {
            fn on(&self, event: &str, cb: crate::bus::Callback) -> Unsubscribe {
                self.kept.lock().unwrap().push(cb.clone());
                self.inner.on(event, cb)
            }
            fn off(&self, event: &str, cb: &crate::bus::Callback) {
                self.inner.off(event, cb)
            }
            fn emit(&self, event: &str, payload: Payload) {
                self.inner.emit(event, payload)
            }
        }

        let leaky = Arc::new(LeakyBus {
            inner: InMemoryEventBus::new(),
            kept: Mutex::new(Vec::new()),
        });
        let shared: SharedEventBus = leaky.clone();
        let bridge = EventBridge::new(Some(shared), MountId::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        bridge.subscribe(EventName::AuthChange, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        bridge.release();
        for cb in leaky.kept.lock().unwrap().iter() {
            cb(&Payload::Json(json!({ "isAuthenticated": true })));
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_bus_makes_everything_a_no_op() {
        let bridge = EventBridge::new(None, MountId::new());
        assert!(!bridge.is_connected());
        bridge.loaded("x");
        assert!(!bridge.subscribe(EventName::AuthChange, |_| {}));
        assert_eq!(bridge.release(), 0);
    }

    #[test]
    fn rejects_subscribing_to_outbound_events_and_after_release() {
        let bus = InMemoryEventBus::new();
        let bridge = bridge_on(&bus);
        assert!(!bridge.subscribe(EventName::Loaded, |_| {}));

        bridge.release();
        assert!(!bridge.subscribe(EventName::AuthChange, |_| {}));
        assert_eq!(bus.total_listeners(), 0);
    }

    #[test]
    fn emit_after_release_is_suppressed() {
        let bus = InMemoryEventBus::recording();
        let bridge = bridge_on(&bus);
        bridge.release();
        bridge.request_auth();
        assert!(bus.history().is_empty());
    }
}
