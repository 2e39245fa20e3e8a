//! Module configuration, read from the process environment.

use std::str::FromStr;

use microapp_observability::{LogFormat, UnknownLogFormat};
use serde::Serialize;
use thiserror::Error;

/// Name announced to the shell in `micro:loaded`.
pub const MODULE_NAME: &str = "micro-app-demo";

pub const MODULE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BASE_PATH: &str = "/micro-app-demo";

pub const DEFAULT_TITLE: &str = "Micro App Demo";

pub const WELCOME_MESSAGE: &str = "Micro App Demo loaded successfully!";

/// How the artifact is run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Self-mounts with a development shell.
    Standalone,
    /// Waits for a host shell to call the lifecycle functions.
    #[default]
    Embedded,
}

impl FromStr for BuildMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standalone" => Ok(BuildMode::Standalone),
            "embedded" => Ok(BuildMode::Embedded),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid MICROAPP_MODE '{0}' (expected standalone or embedded)")]
    InvalidMode(String),

    #[error("invalid MICROAPP_LOG_FORMAT: {0}")]
    InvalidLogFormat(#[from] UnknownLogFormat),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleConfig {
    pub name: String,
    pub title: String,
    pub welcome_message: String,
    pub mode: BuildMode,
    pub log_format: LogFormat,
    /// Base path used by the standalone runner; embedded mounts get theirs from the shell.
    pub base_path: String,
    /// Initial path used by the standalone runner.
    pub start_path: String,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            name: MODULE_NAME.to_string(),
            title: DEFAULT_TITLE.to_string(),
            welcome_message: WELCOME_MESSAGE.to_string(),
            mode: BuildMode::default(),
            log_format: LogFormat::default(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            start_path: String::new(),
        }
    }
}

impl ModuleConfig {
    /// Load from `MICROAPP_*` environment variables; unset variables keep defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(mode) = lookup("MICROAPP_MODE") {
            config.mode = mode.parse()?;
        }
        if let Some(format) = lookup("MICROAPP_LOG_FORMAT") {
            config.log_format = format.parse()?;
        }
        if let Some(base_path) = lookup("MICROAPP_BASE_PATH") {
            config.base_path = base_path;
        }
        if let Some(start_path) = lookup("MICROAPP_START_PATH") {
            config.start_path = start_path;
        }

        Ok(config)
    }

    pub fn is_standalone(&self) -> bool {
        self.mode == BuildMode::Standalone
    }
}
