//! `microapp-auth` — the module's read-only view of the shell's auth state.
//!
//! The shell owns authentication. This crate only caches the latest snapshot
//! it was given and never mutates it.

pub mod store;

pub use store::{AuthSnapshot, AuthSource, AuthStore};
