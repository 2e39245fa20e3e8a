//! `microapp-core` — contract primitives shared by the shell-facing crates.
//!
//! This crate contains the data that crosses the shell/module boundary
//! (auth state, notification levels, identifiers). No IO, no runtime state.

pub mod auth;
pub mod error;
pub mod id;
pub mod notification;

pub use auth::{AuthState, User};
pub use error::{ContractError, ContractResult};
pub use id::{ContainerId, MountId};
pub use notification::NotificationLevel;
