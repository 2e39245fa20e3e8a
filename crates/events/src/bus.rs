//! Event bus capability (mechanics only).
//!
//! The shell owns the bus; the module receives a reference at mount time and
//! talks to the shell exclusively through it. The contract is deliberately
//! tiny (`on`/`off`/`emit`) so any host can provide a conforming object.
//!
//! ## Unsubscribe contract
//!
//! `on` returns an [`Unsubscribe`] handle. Once that handle has been invoked,
//! the callback must never be invoked again, including by an `emit` that is
//! already in progress. The module relies on this to avoid leaking listeners
//! into the shell's bus across mount cycles.
//!
//! ## Payloads
//!
//! Most payloads are plain JSON. The shell also hands over live function
//! references (the HTTP capability), which cannot be serialized, so a payload
//! may alternatively carry an opaque [`Capability`].

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

/// Listener registered on the bus.
///
/// Identity is the `Arc` pointer: `off` removes listeners that are
/// `Arc::ptr_eq` to the given callback.
pub type Callback = Arc<dyn Fn(&Payload) + Send + Sync>;

/// Wrap a closure as a bus [`Callback`].
pub fn callback<F>(f: F) -> Callback
where
    F: Fn(&Payload) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Opaque, type-erased value carried by an event (e.g. a set of functions).
#[derive(Clone)]
pub struct Capability(Arc<dyn Any + Send + Sync>);

impl Capability {
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self(Arc::new(value))
    }

    /// Borrow the carried value if it is a `T`.
    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: Any + Send + Sync,
    {
        self.0.downcast_ref::<T>()
    }
}

impl core::fmt::Debug for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Capability(..)")
    }
}

/// Body of an event.
#[derive(Debug, Clone)]
pub enum Payload {
    Json(Value),
    Capability(Capability),
}

impl Payload {
    /// The `{}` payload used by request events.
    pub fn empty() -> Self {
        Payload::Json(Value::Object(Default::default()))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) => Some(v),
            Payload::Capability(_) => None,
        }
    }

    pub fn as_capability(&self) -> Option<&Capability> {
        match self {
            Payload::Capability(c) => Some(c),
            Payload::Json(_) => None,
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<Capability> for Payload {
    fn from(value: Capability) -> Self {
        Payload::Capability(value)
    }
}

/// Handle returned by [`EventBus::on`].
///
/// Dropping the handle does **not** unsubscribe; call
/// [`Unsubscribe::unsubscribe`] explicitly.
pub struct Unsubscribe {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Unsubscribe {
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Handle for a subscription that never existed (nothing to release).
    pub fn noop() -> Self {
        Self { release: None }
    }

    pub fn unsubscribe(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl core::fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("pending", &self.release.is_some())
            .finish()
    }
}

/// Shell-supplied publish/subscribe object.
///
/// Event names are plain strings at this level because the shell speaks
/// strings; the module side only ever uses the names from
/// [`EventName`](crate::EventName).
pub trait EventBus: Send + Sync {
    fn on(&self, event: &str, callback: Callback) -> Unsubscribe;

    fn off(&self, event: &str, callback: &Callback);

    fn emit(&self, event: &str, payload: Payload);
}

/// Reference to the shell's bus as handed over in the mount props.
pub type SharedEventBus = Arc<dyn EventBus>;

impl<B> EventBus for Arc<B>
where
    B: EventBus + ?Sized,
{
    fn on(&self, event: &str, callback: Callback) -> Unsubscribe {
        (**self).on(event, callback)
    }

    fn off(&self, event: &str, callback: &Callback) {
        (**self).off(event, callback)
    }

    fn emit(&self, event: &str, payload: Payload) {
        (**self).emit(event, payload)
    }
}
