//! Lifecycle entry points invoked by the shell.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use microapp_core::{AuthState, ContainerId, MountId};
use microapp_services::{ApiClient, ApiService};

use crate::app::{App, AppContext};
use crate::config::ModuleConfig;
use crate::error::{MountError, MountResult};
use crate::props::MountProps;
use crate::render::Renderer;

/// The four functions a host shell calls on a micro-frontend.
///
/// Misuse (unmount without mount, updates before mount, unknown containers)
/// is logged and ignored; only a failure to draw into the container is an
/// error.
pub trait MicroFrontend: Send + Sync {
    fn mount(&self, container: &ContainerId, props: MountProps) -> MountResult<()>;

    /// Tear down the tree. `None` unmounts whatever is mounted.
    fn unmount(&self, container: Option<&ContainerId>);

    fn update_path(&self, path: &str);

    fn update_auth(&self, auth_state: AuthState);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LifecycleStatus {
    Unmounted,
    Mounted {
        mount_id: MountId,
        container: ContainerId,
        mounted_at: DateTime<Utc>,
    },
}

impl LifecycleStatus {
    pub fn is_mounted(&self) -> bool {
        matches!(self, LifecycleStatus::Mounted { .. })
    }
}

struct Mounted {
    app: App,
    mounted_at: DateTime<Utc>,
}

/// Holds at most one mounted tree and routes shell calls to it.
pub struct LifecycleController {
    config: Arc<ModuleConfig>,
    renderer: Arc<dyn Renderer>,
    api: Arc<ApiService>,
    mounted: Mutex<Option<Mounted>>,
}

impl LifecycleController {
    pub fn new(config: ModuleConfig, renderer: Arc<dyn Renderer>) -> Self {
        Self::with_api_service(config, renderer, Arc::new(ApiService::new()))
    }

    /// Use an existing function container, e.g. one whose clients were
    /// already handed out before the first mount.
    pub fn with_api_service(
        config: ModuleConfig,
        renderer: Arc<dyn Renderer>,
        api: Arc<ApiService>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            renderer,
            api,
            mounted: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn api_service(&self) -> &Arc<ApiService> {
        &self.api
    }

    /// Client for feature code. Stays valid across mounts and re-injections.
    pub fn api(&self) -> ApiClient {
        ApiClient::new(self.api.clone())
    }

    pub fn status(&self) -> LifecycleStatus {
        match self.lock().as_ref() {
            None => LifecycleStatus::Unmounted,
            Some(m) => LifecycleStatus::Mounted {
                mount_id: m.app.mount_id(),
                container: m.app.container().clone(),
                mounted_at: m.mounted_at,
            },
        }
    }

    /// Handle to the mounted tree, if any.
    pub fn app(&self) -> Option<App> {
        self.lock().as_ref().map(|m| m.app.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Option<Mounted>> {
        self.mounted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn teardown(mounted: Mounted, reason: &str) {
        let mount_id = mounted.app.mount_id();
        let released = mounted.app.teardown();
        tracing::info!(
            %mount_id,
            container = %mounted.app.container(),
            released,
            reason,
            "micro-frontend unmounted"
        );
    }
}

impl MicroFrontend for LifecycleController {
    fn mount(&self, container: &ContainerId, props: MountProps) -> MountResult<()> {
        tracing::info!(%container, ?props, "mounting micro-frontend");

        let previous = self.lock().take();
        if let Some(previous) = previous {
            tracing::warn!(
                previous = %previous.app.container(),
                "mount called while already mounted; tearing down the previous root"
            );
            Self::teardown(previous, "remount");
        }

        let root = self
            .renderer
            .create_root(container)
            .map_err(|source| MountError::CreateRoot {
                container: container.clone(),
                source,
            })?;

        let cycle = MountId::new();
        let app = App::mount(
            root,
            props,
            AppContext {
                container: container.clone(),
                cycle,
                config: self.config.clone(),
                api: self.api.clone(),
            },
        )?;

        // Reachable through `app()` before the handshake starts, so a shell
        // answering synchronously via `update_auth`/`update_path` lands here.
        let stale = self.lock().replace(Mounted {
            app: app.clone(),
            mounted_at: Utc::now(),
        });
        if let Some(stale) = stale {
            // A concurrent mount finished first; keep the newest.
            Self::teardown(stale, "superseded");
        }

        tracing::info!(mount_id = %cycle, %container, "micro-frontend mounted");
        app.connect();
        Ok(())
    }

    fn unmount(&self, container: Option<&ContainerId>) {
        let taken = {
            let mut mounted = self.lock();
            match (mounted.as_ref(), container) {
                (None, _) => {
                    tracing::warn!(requested = ?container, "unmount called with nothing mounted");
                    None
                }
                (Some(m), Some(requested)) if m.app.container() != requested => {
                    tracing::warn!(
                        %requested,
                        mounted = %m.app.container(),
                        "unmount called for a container that is not mounted; ignored"
                    );
                    None
                }
                (Some(_), _) => mounted.take(),
            }
        };

        if let Some(mounted) = taken {
            Self::teardown(mounted, "unmount");
        }
    }

    fn update_path(&self, path: &str) {
        match self.app() {
            Some(app) => {
                app.navigate(path);
            }
            None => tracing::warn!(path, "update_path called before mount; ignored"),
        }
    }

    fn update_auth(&self, auth_state: AuthState) {
        match self.app() {
            Some(app) => {
                app.update_auth(auth_state);
            }
            None => tracing::warn!("update_auth called before mount; ignored"),
        }
    }
}

impl core::fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LifecycleController")
            .field("name", &self.config.name)
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MemoryRenderer;

    fn controller() -> (LifecycleController, MemoryRenderer) {
        let renderer = MemoryRenderer::new();
        let controller =
            LifecycleController::new(ModuleConfig::default(), Arc::new(renderer.clone()));
        (controller, renderer)
    }

    #[test]
    fn status_follows_the_state_machine() {
        let (controller, _) = controller();
        let container = ContainerId::from("root");
        assert_eq!(controller.status(), LifecycleStatus::Unmounted);

        controller.mount(&container, MountProps::new("/demo")).unwrap();
        match controller.status() {
            LifecycleStatus::Mounted {
                container: mounted, ..
            } => assert_eq!(mounted, container),
            other => panic!("expected mounted, got {other:?}"),
        }

        controller.unmount(Some(&container));
        assert!(!controller.status().is_mounted());
    }

    #[test]
    fn remount_gets_a_fresh_cycle() {
        let (controller, renderer) = controller();
        let container = ContainerId::from("root");

        controller.mount(&container, MountProps::new("/demo")).unwrap();
        let first = controller.app().unwrap();
        controller.mount(&container, MountProps::new("/demo")).unwrap();
        let second = controller.app().unwrap();

        assert_ne!(first.mount_id(), second.mount_id());
        assert!(!first.is_live());
        assert!(second.is_live());
        assert_eq!(renderer.attached_count(), 1);
    }

    #[test]
    fn create_root_failure_leaves_controller_unmounted() {
        let renderer = MemoryRenderer::new().with_unavailable("gone");
        let controller = LifecycleController::new(ModuleConfig::default(), Arc::new(renderer));

        let err = controller
            .mount(&ContainerId::from("gone"), MountProps::new("/demo"))
            .unwrap_err();
        assert!(matches!(err, MountError::CreateRoot { .. }));
        assert_eq!(err.container().as_str(), "gone");
        assert_eq!(controller.status(), LifecycleStatus::Unmounted);
    }

    #[test]
    fn updates_before_mount_are_ignored() {
        let (controller, _) = controller();
        controller.update_path("/customers");
        controller.update_auth(AuthState::anonymous());
        controller.unmount(None);
        assert_eq!(controller.status(), LifecycleStatus::Unmounted);
    }
}
