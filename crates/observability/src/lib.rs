//! Tracing/logging setup shared by the module binary and host adapters.

/// Initialize process-wide logging with the default (JSON) format.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(LogFormat::default());
}

/// Initialize process-wide logging with an explicit format.
pub fn init_with(format: LogFormat) {
    tracing::init(format);
}

/// Tracing configuration (filters, formatters).
pub mod tracing;

pub use crate::tracing::{LogFormat, UnknownLogFormat};
