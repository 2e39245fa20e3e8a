//! Severity of a user-facing notification rendered by the shell.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::ContractError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
    #[default]
    Info,
    Warning,
}

impl NotificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationLevel::Success => "success",
            NotificationLevel::Error => "error",
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warning",
        }
    }
}

impl core::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationLevel {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(NotificationLevel::Success),
            "error" => Ok(NotificationLevel::Error),
            "info" => Ok(NotificationLevel::Info),
            "warning" => Ok(NotificationLevel::Warning),
            other => Err(ContractError::unknown("notification level", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_level_and_rejects_others() {
        for level in [
            NotificationLevel::Success,
            NotificationLevel::Error,
            NotificationLevel::Info,
            NotificationLevel::Warning,
        ] {
            assert_eq!(level.as_str().parse::<NotificationLevel>().unwrap(), level);
        }
        assert!("fatal".parse::<NotificationLevel>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        let v = serde_json::to_value(NotificationLevel::Warning).unwrap();
        assert_eq!(v, serde_json::json!("warning"));
    }
}
