use thiserror::Error;

use microapp_core::ContainerId;

use crate::render::RenderError;

pub type MountResult<T> = Result<T, MountError>;

#[derive(Debug, Error)]
pub enum MountError {
    #[error("failed to create render root in {container}: {source}")]
    CreateRoot {
        container: ContainerId,
        #[source]
        source: RenderError,
    },

    #[error("initial render in {container} failed: {source}")]
    InitialRender {
        container: ContainerId,
        #[source]
        source: RenderError,
    },
}

impl MountError {
    pub fn container(&self) -> &ContainerId {
        match self {
            MountError::CreateRoot { container, .. }
            | MountError::InitialRender { container, .. } => container,
        }
    }
}
