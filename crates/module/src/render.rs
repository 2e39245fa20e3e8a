//! Rendering seam between the module and whatever draws it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use microapp_core::ContainerId;

use crate::view::AppView;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("container {0} is not available")]
    ContainerUnavailable(ContainerId),

    #[error("container {0} already hosts a render root")]
    AlreadyAttached(ContainerId),

    #[error("render root for {0} was unmounted")]
    Detached(ContainerId),

    #[error("render failed: {0}")]
    Failed(String),
}

/// A tree attached to one container.
pub trait RenderRoot: Send {
    fn render(&mut self, view: &AppView) -> Result<(), RenderError>;

    /// Detach from the container. Idempotent.
    fn unmount(&mut self);
}

/// Creates render roots inside host containers.
pub trait Renderer: Send + Sync {
    fn create_root(&self, container: &ContainerId) -> Result<Box<dyn RenderRoot>, RenderError>;
}

#[derive(Debug, Default)]
struct Surface {
    attached: bool,
    frames: Vec<AppView>,
}

#[derive(Debug, Default)]
struct Surfaces {
    by_container: HashMap<ContainerId, Surface>,
    unavailable: HashSet<ContainerId>,
}

/// Renderer that keeps every frame in memory.
///
/// Used by the standalone runner and by tests to inspect what was drawn.
#[derive(Debug, Clone, Default)]
pub struct MemoryRenderer {
    surfaces: Arc<Mutex<Surfaces>>,
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create_root` fail for `container`.
    pub fn with_unavailable(self, container: impl Into<ContainerId>) -> Self {
        self.lock().unavailable.insert(container.into());
        self
    }

    pub fn is_attached(&self, container: &ContainerId) -> bool {
        self.lock()
            .by_container
            .get(container)
            .is_some_and(|s| s.attached)
    }

    pub fn attached_count(&self) -> usize {
        self.lock().by_container.values().filter(|s| s.attached).count()
    }

    /// Frames drawn by the current (or last) root in `container`.
    pub fn frames(&self, container: &ContainerId) -> Vec<AppView> {
        self.lock()
            .by_container
            .get(container)
            .map(|s| s.frames.clone())
            .unwrap_or_default()
    }

    pub fn last_frame(&self, container: &ContainerId) -> Option<AppView> {
        self.lock()
            .by_container
            .get(container)
            .and_then(|s| s.frames.last().cloned())
    }

    fn lock(&self) -> MutexGuard<'_, Surfaces> {
        self.surfaces
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Renderer for MemoryRenderer {
    fn create_root(&self, container: &ContainerId) -> Result<Box<dyn RenderRoot>, RenderError> {
        let mut surfaces = self.lock();
        if surfaces.unavailable.contains(container) {
            return Err(RenderError::ContainerUnavailable(container.clone()));
        }

        let surface = surfaces.by_container.entry(container.clone()).or_default();
        if surface.attached {
            return Err(RenderError::AlreadyAttached(container.clone()));
        }
        surface.attached = true;
        surface.frames.clear();

        Ok(Box::new(MemoryRoot {
            container: container.clone(),
            surfaces: self.surfaces.clone(),
            detached: false,
        }))
    }
}

struct MemoryRoot {
    container: ContainerId,
    surfaces: Arc<Mutex<Surfaces>>,
    detached: bool,
}

impl MemoryRoot {
    fn with_surface<R>(&self, f: impl FnOnce(&mut Surface) -> R) -> Option<R> {
        let mut surfaces = self
            .surfaces
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        surfaces.by_container.get_mut(&self.container).map(f)
    }
}

impl RenderRoot for MemoryRoot {
    fn render(&mut self, view: &AppView) -> Result<(), RenderError> {
        if self.detached {
            return Err(RenderError::Detached(self.container.clone()));
        }
        self.with_surface(|s| s.frames.push(view.clone()))
            .ok_or_else(|| RenderError::Detached(self.container.clone()))
    }

    fn unmount(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;
        self.with_surface(|s| s.attached = false);
    }
}
