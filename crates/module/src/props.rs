//! What the shell hands over when it mounts the module.

use microapp_core::AuthState;
use microapp_events::SharedEventBus;

/// Mount-time properties.
///
/// Only `base_path` is required. A missing bus disables every shell
/// interaction for the cycle but does not fail the mount.
#[derive(Clone, Default)]
pub struct MountProps {
    /// URL prefix under which the shell hosts the module.
    pub base_path: String,
    /// Auth state at mount time; `None` until the shell answers.
    pub auth_state: Option<AuthState>,
    pub event_bus: Option<SharedEventBus>,
    /// Initial in-module path. Empty means the default route.
    pub path: String,
    /// `true` when the shell supplies the page chrome.
    pub is_embedded: bool,
}

impl MountProps {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    pub fn with_auth_state(mut self, auth_state: Option<AuthState>) -> Self {
        self.auth_state = auth_state;
        self
    }

    pub fn with_event_bus(mut self, event_bus: SharedEventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn embedded(mut self, is_embedded: bool) -> Self {
        self.is_embedded = is_embedded;
        self
    }
}

impl core::fmt::Debug for MountProps {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MountProps")
            .field("base_path", &self.base_path)
            .field(
                "authenticated",
                &self.auth_state.as_ref().map(|a| a.is_authenticated),
            )
            .field("event_bus", &self.event_bus.is_some())
            .field("path", &self.path)
            .field("is_embedded", &self.is_embedded)
            .finish()
    }
}
