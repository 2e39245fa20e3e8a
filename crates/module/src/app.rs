//! The mounted application tree for one mount cycle.
//!
//! An [`App`] owns the render root, the router, the auth cache, and the
//! event bridge of a single cycle. The lifecycle controller keeps the handle
//! while mounted and drops it on unmount; nothing here is global.
//!
//! Locking: the view state lock is never held while emitting to the shell's
//! bus, since a shell may answer synchronously from inside `emit`.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use microapp_auth::{AuthSnapshot, AuthSource, AuthStore};
use microapp_core::{AuthState, ContainerId, MountId, NotificationLevel};
use microapp_events::{EventBridge, EventName, ShellEvent};
use microapp_services::{ApiClient, ApiFunctions, ApiResource, ApiService};
use serde::de::DeserializeOwned;

use crate::config::ModuleConfig;
use crate::error::{MountError, MountResult};
use crate::notify::Notifier;
use crate::props::MountProps;
use crate::render::{RenderError, RenderRoot};
use crate::router::{Route, Router};
use crate::view::{AppView, Chrome};

/// Shell → module events the tree listens to while mounted.
const SUBSCRIBED: [EventName; 4] = [
    EventName::AuthChange,
    EventName::ApiFunctions,
    EventName::PathChanged,
    EventName::Navigate,
];

pub(crate) struct AppContext {
    pub container: ContainerId,
    pub cycle: MountId,
    pub config: Arc<ModuleConfig>,
    pub api: Arc<ApiService>,
}

struct ViewState {
    router: Router,
    collapsed: bool,
    root: Box<dyn RenderRoot>,
}

struct AppInner {
    container: ContainerId,
    config: Arc<ModuleConfig>,
    is_embedded: bool,
    auth: AuthStore,
    api: Arc<ApiService>,
    bridge: Arc<EventBridge>,
    state: Mutex<ViewState>,
}

/// Handle to a mounted tree. Cheap to clone.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

impl App {
    /// Build the tree and draw the first frame.
    ///
    /// Nothing is emitted to the shell yet; the owner calls [`App::connect`]
    /// once the handle is reachable. On a failed first render the root is
    /// unmounted again.
    pub(crate) fn mount(
        root: Box<dyn RenderRoot>,
        props: MountProps,
        ctx: AppContext,
    ) -> MountResult<App> {
        let MountProps {
            base_path,
            auth_state,
            event_bus,
            path,
            is_embedded,
        } = props;

        let inner = Arc::new(AppInner {
            container: ctx.container,
            config: ctx.config,
            is_embedded,
            auth: AuthStore::new(auth_state),
            api: ctx.api,
            bridge: Arc::new(EventBridge::new(event_bus, ctx.cycle)),
            state: Mutex::new(ViewState {
                router: Router::new(&base_path, &path),
                collapsed: false,
                root,
            }),
        });

        if let Err(source) = inner.render() {
            inner.teardown();
            return Err(MountError::InitialRender {
                container: inner.container.clone(),
                source,
            });
        }

        Ok(App { inner })
    }

    /// Announce the module, subscribe to shell events, then request auth and
    /// API functions.
    ///
    /// A shell may answer synchronously, including through the lifecycle
    /// entry points, so the caller must not hold any lock here.
    pub(crate) fn connect(&self) {
        let inner = &self.inner;
        let bridge = &inner.bridge;
        if !bridge.is_connected() || !bridge.is_live() {
            return;
        }

        bridge.loaded(inner.config.name.clone());
        bridge.notify(NotificationLevel::Success, inner.config.welcome_message.clone());

        for name in SUBSCRIBED {
            let weak: Weak<AppInner> = Arc::downgrade(inner);
            bridge.subscribe(name, move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_shell_event(event);
                }
            });
        }

        bridge.request_auth();
        bridge.request_api_functions();
    }

    pub fn mount_id(&self) -> MountId {
        self.inner.bridge.cycle()
    }

    pub fn container(&self) -> &ContainerId {
        &self.inner.container
    }

    pub fn is_live(&self) -> bool {
        self.inner.bridge.is_live()
    }

    /// Move to `path` and redraw if the location changed.
    pub fn navigate(&self, path: &str) -> bool {
        self.inner.navigate(path)
    }

    /// Replace the cached auth state on the shell's direct call.
    pub fn update_auth(&self, state: AuthState) -> bool {
        self.inner.apply_auth(state, AuthSource::DirectUpdate)
    }

    pub fn toggle_sidebar(&self) -> bool {
        let collapsed = {
            let mut state = self.inner.lock();
            state.collapsed = !state.collapsed;
            state.collapsed
        };
        self.inner.rerender();
        collapsed
    }

    pub fn auth(&self) -> Arc<AuthSnapshot> {
        self.inner.auth.snapshot()
    }

    pub fn route(&self) -> Route {
        self.inner.lock().router.route().clone()
    }

    /// The frame the tree would draw right now.
    pub fn view(&self) -> AppView {
        let state = self.inner.lock();
        self.inner.view_of(&state)
    }

    pub fn api(&self) -> ApiClient {
        ApiClient::new(self.inner.api.clone())
    }

    pub fn notifier(&self) -> Notifier {
        Notifier::new(self.inner.bridge.clone())
    }

    /// Resource at `url` whose failures are shown as shell notifications.
    pub fn resource<T>(&self, url: impl Into<String>) -> ApiResource<T>
    where
        T: DeserializeOwned,
    {
        let notifier = self.notifier();
        ApiResource::new(self.api(), url).with_error_hook(move |err| notifier.api_error(err))
    }

    /// Ask the shell to change its own route.
    pub fn navigate_shell(&self, path: impl Into<String>) {
        self.inner.bridge.navigate_shell(path);
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.bridge.subscription_count()
    }

    /// End the cycle: drop every shell subscription and detach the root.
    ///
    /// Returns the number of subscriptions released. Idempotent.
    pub(crate) fn teardown(&self) -> usize {
        self.inner.teardown()
    }
}

impl core::fmt::Debug for App {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("App")
            .field("mount_id", &self.mount_id())
            .field("container", &self.inner.container)
            .field("live", &self.is_live())
            .finish()
    }
}

impl AppInner {
    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn on_shell_event(&self, event: ShellEvent) {
        tracing::debug!(mount_id = %self.bridge.cycle(), event = %event.name(), "shell event");
        match event {
            ShellEvent::AuthChanged(state) => {
                self.apply_auth(state, AuthSource::ShellEvent);
            }
            ShellEvent::ApiFunctions(capability) => {
                match capability.downcast_ref::<ApiFunctions>() {
                    Some(functions) => {
                        self.api.set_api_service(functions.clone());
                        self.rerender();
                    }
                    None => {
                        tracing::warn!(
                            mount_id = %self.bridge.cycle(),
                            "api-functions payload is not an API function set; ignored"
                        );
                    }
                }
            }
            ShellEvent::PathChanged { path, .. } | ShellEvent::Navigate { path } => {
                self.navigate(&path);
            }
        }
    }

    fn navigate(&self, path: &str) -> bool {
        let changed = {
            let mut state = self.lock();
            if !self.bridge.is_live() {
                tracing::warn!(
                    mount_id = %self.bridge.cycle(),
                    path,
                    "navigate after unmount ignored"
                );
                return false;
            }
            state.router.navigate(path)
        };
        if changed {
            tracing::debug!(mount_id = %self.bridge.cycle(), path, "navigated");
            self.rerender();
        }
        changed
    }

    fn apply_auth(&self, state: AuthState, source: AuthSource) -> bool {
        if !self.bridge.is_live() {
            tracing::warn!(
                mount_id = %self.bridge.cycle(),
                ?source,
                "auth update after unmount ignored"
            );
            return false;
        }
        let changed = self.auth.replace(state, source);
        if changed {
            self.rerender();
        }
        changed
    }

    fn view_of(&self, state: &ViewState) -> AppView {
        let auth = self.auth.snapshot();
        let route = state.router.route().clone();

        let chrome = (!self.is_embedded).then(|| {
            Chrome::build(
                &self.config.title,
                state.collapsed,
                route.section(),
                |slug| state.router.href(slug),
                auth.state.as_ref().and_then(AuthState::display_name),
            )
        });

        AppView {
            mount_id: self.bridge.cycle(),
            base_path: state.router.base_path().to_string(),
            location: state.router.location().to_string(),
            route,
            chrome,
            authenticated: auth.is_authenticated(),
            auth_revision: auth.revision,
            api_ready: !self.api.injected().is_empty(),
        }
    }

    fn render(&self) -> Result<(), RenderError> {
        let mut state = self.lock();
        if !self.bridge.is_live() {
            return Ok(());
        }
        let view = self.view_of(&state);
        state.root.render(&view)
    }

    fn rerender(&self) {
        if let Err(err) = self.render() {
            tracing::error!(
                mount_id = %self.bridge.cycle(),
                container = %self.container,
                error = %err,
                "render failed"
            );
        }
    }

    fn teardown(&self) -> usize {
        let released = self.bridge.release();
        self.lock().root.unmount();
        released
    }
}
