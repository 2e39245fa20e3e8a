//! Standalone development runner.
//!
//! Mounts the module with the development shell into an in-memory renderer,
//! optionally walks through the paths given as arguments, prints the last
//! frame as JSON, and unmounts.

use std::sync::Arc;

use anyhow::Context;

use microapp_module::{
    BuildMode, LifecycleController, MODULE_VERSION, MemoryRenderer, MicroFrontend, ModuleConfig,
    standalone::{DevShell, mount_standalone},
};

fn main() -> anyhow::Result<()> {
    let config = ModuleConfig::from_env().context("invalid module configuration")?;
    microapp_observability::init_with(config.log_format);

    tracing::info!(
        name = %config.name,
        version = MODULE_VERSION,
        mode = ?config.mode,
        "micro-frontend starting"
    );

    if config.mode == BuildMode::Embedded {
        tracing::info!("embedded build: the host shell mounts the module; nothing to run");
        return Ok(());
    }

    let renderer = MemoryRenderer::new();
    let controller = LifecycleController::new(config, Arc::new(renderer.clone()));
    let shell = DevShell::new();

    let container = mount_standalone(&controller, &shell).context("standalone mount failed")?;
    for path in std::env::args().skip(1) {
        controller.update_path(&path);
    }

    if let Some(frame) = renderer.last_frame(&container) {
        println!("{}", serde_json::to_string_pretty(&frame)?);
    }

    controller.unmount(Some(&container));
    Ok(())
}
