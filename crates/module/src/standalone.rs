//! Standalone development mode: the module mounts itself with a stand-in shell.

use std::sync::{Arc, Mutex, MutexGuard};

use microapp_core::{AuthState, ContainerId, User};
use microapp_events::{
    Callback, Capability, EventBus, EventName, InMemoryEventBus, Payload, SharedEventBus,
    Unsubscribe, callback,
};
use microapp_services::ApiFunctions;

use crate::error::MountResult;
use crate::lifecycle::{LifecycleController, MicroFrontend};
use crate::props::MountProps;

/// Container the standalone runner draws into.
pub const DEV_CONTAINER: &str = "root";

/// Auth state the development shell hands out.
pub fn dev_auth_state() -> AuthState {
    AuthState::authenticated(
        "dev-token",
        User {
            id: "dev-user".to_string(),
            name: "Developer".to_string(),
            email: "dev@example.com".to_string(),
            roles: vec!["admin".to_string()],
        },
    )
    .with_refresh_token("dev-refresh-token")
}

/// Bus that logs every call before delegating to an in-memory bus.
#[derive(Debug, Clone)]
pub struct DevEventBus {
    inner: InMemoryEventBus,
}

impl DevEventBus {
    pub fn new() -> Self {
        Self {
            inner: InMemoryEventBus::recording(),
        }
    }

    pub fn inner(&self) -> &InMemoryEventBus {
        &self.inner
    }
}

impl Default for DevEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for DevEventBus {
    fn on(&self, event: &str, callback: Callback) -> Unsubscribe {
        tracing::info!(target: "dev_bus", event, "listener registered");
        let handle = self.inner.on(event, callback);
        let event = event.to_string();
        Unsubscribe::new(move || {
            tracing::info!(target: "dev_bus", event = %event, "listener removed");
            handle.unsubscribe();
        })
    }

    fn off(&self, event: &str, callback: &Callback) {
        tracing::info!(target: "dev_bus", event, "listener removed by reference");
        self.inner.off(event, callback);
    }

    fn emit(&self, event: &str, payload: Payload) {
        match payload.as_json() {
            Some(json) => tracing::info!(target: "dev_bus", event, payload = %json, "emit"),
            None => tracing::info!(target: "dev_bus", event, "emit (capability)"),
        }
        self.inner.emit(event, payload);
    }
}

/// Stand-in shell for standalone runs and tests.
///
/// Answers `micro:request-auth` with its auth state and, when configured,
/// `micro:request-api-functions` with a function set. Unanswered requests
/// leave the module on its stubs, as with a silent real shell.
pub struct DevShell {
    bus: Arc<DevEventBus>,
    auth: AuthState,
    responders: Mutex<Vec<Unsubscribe>>,
}

impl DevShell {
    pub fn new() -> Self {
        Self::with_auth(dev_auth_state())
    }

    pub fn with_auth(auth: AuthState) -> Self {
        let shell = Self {
            bus: Arc::new(DevEventBus::new()),
            auth,
            responders: Mutex::new(Vec::new()),
        };
        shell.answer_auth_requests();
        shell
    }

    /// Also answer API function requests with `functions`.
    pub fn answering_api_functions(self, functions: ApiFunctions) -> Self {
        let bus = self.bus.clone();
        let handle = self.bus.on(
            EventName::RequestApiFunctions.as_str(),
            callback(move |_| {
                bus.emit(
                    EventName::ApiFunctions.as_str(),
                    Payload::from(Capability::new(functions.clone())),
                );
            }),
        );
        self.responders().push(handle);
        self
    }

    pub fn auth_state(&self) -> &AuthState {
        &self.auth
    }

    pub fn bus(&self) -> &Arc<DevEventBus> {
        &self.bus
    }

    pub fn shared_bus(&self) -> SharedEventBus {
        self.bus.clone()
    }

    /// Listeners the module currently holds (the shell's own responders excluded).
    pub fn module_listeners(&self) -> usize {
        self.bus.inner().total_listeners() - self.responders().len()
    }

    /// Push an event from the shell side.
    pub fn emit(&self, event: EventName, payload: impl Into<Payload>) {
        self.bus.emit(event.as_str(), payload.into());
    }

    fn answer_auth_requests(&self) {
        let bus = self.bus.clone();
        let auth = self.auth.clone();
        let handle = self.bus.on(
            EventName::RequestAuth.as_str(),
            callback(move |_| match serde_json::to_value(&auth) {
                Ok(json) => bus.emit(EventName::AuthChange.as_str(), Payload::from(json)),
                Err(err) => tracing::error!(error = %err, "failed to encode dev auth state"),
            }),
        );
        self.responders().push(handle);
    }

    fn responders(&self) -> MutexGuard<'_, Vec<Unsubscribe>> {
        self.responders
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for DevShell {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DevShell {
    fn drop(&mut self) {
        for handle in self.responders().drain(..) {
            handle.unsubscribe();
        }
    }
}

impl core::fmt::Debug for DevShell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DevShell")
            .field("bus", &self.bus)
            .field("authenticated", &self.auth.is_authenticated)
            .finish()
    }
}

/// Mount into [`DEV_CONTAINER`] the way a shell would, wired to `shell`.
pub fn mount_standalone(
    controller: &LifecycleController,
    shell: &DevShell,
) -> MountResult<ContainerId> {
    let config = controller.config();
    let container = ContainerId::from(DEV_CONTAINER);
    let props = MountProps::new(config.base_path.clone())
        .with_auth_state(Some(shell.auth_state().clone()))
        .with_event_bus(shell.shared_bus())
        .with_path(config.start_path.clone())
        .embedded(false);

    controller.mount(&container, props)?;
    Ok(container)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleConfig;
    use crate::render::MemoryRenderer;

    #[test]
    fn dev_shell_answers_auth_requests() {
        let shell = DevShell::with_auth(AuthState::anonymous());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = shell.bus().on(
            EventName::AuthChange.as_str(),
            callback(move |p| sink.lock().unwrap().push(p.as_json().cloned())),
        );

        shell.emit(EventName::RequestAuth, Payload::empty());
        handle.unsubscribe();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].as_ref().unwrap()["isAuthenticated"], false);
    }

    #[test]
    fn standalone_mount_greets_the_developer() {
        let renderer = MemoryRenderer::new();
        let controller =
            LifecycleController::new(ModuleConfig::default(), Arc::new(renderer.clone()));
        let shell = DevShell::new();

        let container = mount_standalone(&controller, &shell).unwrap();
        let frame = renderer.last_frame(&container).unwrap();
        assert_eq!(frame.greeting(), Some("Welcome, Developer"));
        assert_eq!(frame.location, "/products");
        assert!(shell.module_listeners() > 0);

        controller.unmount(Some(&container));
        assert_eq!(shell.module_listeners(), 0);
    }
}
