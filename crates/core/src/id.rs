//! Strongly-typed identifiers used across the module.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ContractError;

/// Identifier of one mount cycle (mount → unmount).
///
/// Every log line emitted while a cycle is live carries it, which makes
/// interleaved remounts readable in the shell's console.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MountId(Uuid);

impl MountId {
    /// Create a new identifier (UUIDv7, time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MountId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for MountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for MountId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for MountId {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid =
            Uuid::from_str(s).map_err(|e| ContractError::invalid_id(format!("MountId: {e}")))?;
        Ok(Self(uuid))
    }
}

/// Handle of a host-supplied container (a DOM element id, a window name...).
///
/// The module never inspects it; it is only compared and passed to the
/// renderer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContainerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for ContainerId {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ContractError::invalid_id("ContainerId: empty"));
        }
        Ok(Self(trimmed.to_string()))
    }
}
