//! Cached auth state with last-write-wins semantics.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use microapp_core::{AuthState, User};

/// Where a snapshot came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthSource {
    /// Handed over in the mount props (or absent).
    MountProps,
    /// `shell:auth-change` event.
    ShellEvent,
    /// Direct `update_auth` call from the shell.
    DirectUpdate,
}

/// One immutable view of the auth state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSnapshot {
    /// Bumped on every accepted change; starts at 0.
    pub revision: u64,
    pub source: AuthSource,
    pub state: Option<AuthState>,
}

impl AuthSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.is_authenticated)
    }

    pub fn user(&self) -> Option<&User> {
        self.state.as_ref().and_then(AuthState::user)
    }
}

/// Holder of the latest auth snapshot.
///
/// Every update replaces the whole snapshot in one pointer swap, so readers
/// see either the previous or the next state, never a mix of fields. The
/// latest update to *arrive* wins; payloads carry no sequence numbers.
#[derive(Debug)]
pub struct AuthStore {
    current: ArcSwap<AuthSnapshot>,
}

impl AuthStore {
    pub fn new(initial: Option<AuthState>) -> Self {
        Self {
            current: ArcSwap::from_pointee(AuthSnapshot {
                revision: 0,
                source: AuthSource::MountProps,
                state: initial,
            }),
        }
    }

    pub fn snapshot(&self) -> Arc<AuthSnapshot> {
        self.current.load_full()
    }

    pub fn state(&self) -> Option<AuthState> {
        self.current.load().state.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.load().is_authenticated()
    }

    /// Replace the cached state.
    ///
    /// Returns `false` when `state` equals what is already cached; the
    /// revision is left untouched in that case so repeated identical updates
    /// are invisible to readers.
    pub fn replace(&self, state: AuthState, source: AuthSource) -> bool {
        let mut changed = false;
        self.current.rcu(|prev| {
            if prev.state.as_ref() == Some(&state) {
                changed = false;
                return Arc::clone(prev);
            }
            changed = true;
            Arc::new(AuthSnapshot {
                revision: prev.revision + 1,
                source,
                state: Some(state.clone()),
            })
        });

        if changed {
            tracing::debug!(?source, authenticated = state.is_authenticated, "auth state replaced");
        }
        changed
    }
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new(None)
    }
}
