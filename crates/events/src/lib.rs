//! Shell ⇄ module event protocol.
//!
//! - [`bus`]: the publish/subscribe capability the shell hands to the module.
//! - [`event`]: the closed event vocabulary and its wire payloads.
//! - [`bridge`]: per-mount-cycle adapter that tracks and releases subscriptions.
//! - [`in_memory_bus`]: a conforming bus for tests and standalone development.

pub mod bridge;
pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bridge::EventBridge;
pub use bus::{Callback, Capability, EventBus, Payload, SharedEventBus, Unsubscribe, callback};
pub use event::{
    Direction, EventName, LoadedPayload, ModuleEvent, NavigationPayload, NotificationPayload,
    PathChangedPayload, ShellEvent,
};
pub use in_memory_bus::InMemoryEventBus;
