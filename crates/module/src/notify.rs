//! User-visible notifications, shown by the shell.

use std::sync::Arc;

use microapp_core::NotificationLevel;
use microapp_events::EventBridge;
use microapp_services::{ApiError, ApiErrorKind};

/// Sends `shell:notification` events for the current mount cycle.
///
/// Silently does nothing once the cycle is over or when no bus was provided.
#[derive(Clone)]
pub struct Notifier {
    bridge: Arc<EventBridge>,
}

impl Notifier {
    pub(crate) fn new(bridge: Arc<EventBridge>) -> Self {
        Self { bridge }
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.bridge.notify(level, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Error, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Warning, message);
    }

    /// Surface a failed API call to the user.
    pub fn api_error(&self, err: &ApiError) {
        let level = match err.kind() {
            ApiErrorKind::NotImplemented => NotificationLevel::Warning,
            _ => NotificationLevel::Error,
        };
        self.notify(level, err.to_string());
    }
}

impl core::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Notifier")
            .field("mount_id", &self.bridge.cycle())
            .field("live", &self.bridge.is_live())
            .finish()
    }
}
