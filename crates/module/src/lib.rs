//! `microapp-module` — the micro-frontend as the shell sees it.
//!
//! A host shell drives the module through [`MicroFrontend`]: it mounts the
//! tree into a container, pushes path and auth updates, and unmounts it
//! again. Everything else (auth, HTTP functions, navigation) travels over the
//! shell's event bus.

pub mod app;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod notify;
pub mod props;
pub mod render;
pub mod router;
pub mod standalone;
pub mod view;

pub use app::App;
pub use config::{BuildMode, ConfigError, MODULE_NAME, MODULE_VERSION, ModuleConfig};
pub use error::{MountError, MountResult};
pub use lifecycle::{LifecycleController, LifecycleStatus, MicroFrontend};
pub use notify::Notifier;
pub use props::MountProps;
pub use render::{MemoryRenderer, RenderError, RenderRoot, Renderer};
pub use router::{Page, Route, Router, Section};
pub use standalone::{DevEventBus, DevShell, dev_auth_state, mount_standalone};
pub use view::{AppView, Chrome, MenuItem};
