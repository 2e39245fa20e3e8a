//! Event vocabulary shared by the shell and the module.
//!
//! Names are a closed set: a typo in an event name is a compile error on the
//! module side, and an unknown name coming from the shell is a
//! [`ContractError`].

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use microapp_core::{AuthState, ContractError, NotificationLevel};

use crate::bus::{Capability, Payload};

/// Who emits an event.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    ModuleToShell,
    ShellToModule,
}

/// Every event name exchanged over the bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventName {
    /// `micro:loaded`
    Loaded,
    /// `shell:notification`
    Notification,
    /// `micro:request-auth`
    RequestAuth,
    /// `micro:request-api-functions`
    RequestApiFunctions,
    /// `shell:navigation`
    Navigation,
    /// `shell:auth-change`
    AuthChange,
    /// `shell:api-functions`
    ApiFunctions,
    /// `shell:path-changed`
    PathChanged,
    /// `shell:navigate`
    Navigate,
}

impl EventName {
    pub const ALL: [EventName; 9] = [
        EventName::Loaded,
        EventName::Notification,
        EventName::RequestAuth,
        EventName::RequestApiFunctions,
        EventName::Navigation,
        EventName::AuthChange,
        EventName::ApiFunctions,
        EventName::PathChanged,
        EventName::Navigate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::Loaded => "micro:loaded",
            EventName::Notification => "shell:notification",
            EventName::RequestAuth => "micro:request-auth",
            EventName::RequestApiFunctions => "micro:request-api-functions",
            EventName::Navigation => "shell:navigation",
            EventName::AuthChange => "shell:auth-change",
            EventName::ApiFunctions => "shell:api-functions",
            EventName::PathChanged => "shell:path-changed",
            EventName::Navigate => "shell:navigate",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            EventName::Loaded
            | EventName::Notification
            | EventName::RequestAuth
            | EventName::RequestApiFunctions
            | EventName::Navigation => Direction::ModuleToShell,
            EventName::AuthChange
            | EventName::ApiFunctions
            | EventName::PathChanged
            | EventName::Navigate => Direction::ShellToModule,
        }
    }
}

impl core::fmt::Display for EventName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ContractError::unknown("event name", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedPayload {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    #[serde(rename = "type")]
    pub level: NotificationLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationPayload {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathChangedPayload {
    pub path: String,
    #[serde(rename = "fullPath", default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
}

/// Module → shell events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleEvent {
    Loaded { name: String },
    Notification { level: NotificationLevel, message: String },
    RequestAuth,
    RequestApiFunctions,
    Navigation { path: String },
}

impl ModuleEvent {
    pub fn name(&self) -> EventName {
        match self {
            ModuleEvent::Loaded { .. } => EventName::Loaded,
            ModuleEvent::Notification { .. } => EventName::Notification,
            ModuleEvent::RequestAuth => EventName::RequestAuth,
            ModuleEvent::RequestApiFunctions => EventName::RequestApiFunctions,
            ModuleEvent::Navigation { .. } => EventName::Navigation,
        }
    }

    /// Wire payload for this event.
    pub fn payload(&self) -> Payload {
        let value = match self {
            ModuleEvent::Loaded { name } => to_json(&LoadedPayload { name: name.clone() }),
            ModuleEvent::Notification { level, message } => to_json(&NotificationPayload {
                level: *level,
                message: message.clone(),
            }),
            ModuleEvent::RequestAuth | ModuleEvent::RequestApiFunctions => {
                return Payload::empty();
            }
            ModuleEvent::Navigation { path } => to_json(&NavigationPayload { path: path.clone() }),
        };
        Payload::Json(value)
    }
}

fn to_json<T: Serialize>(value: &T) -> Value {
    // Plain structs of strings/enums; serialization cannot fail.
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Shell → module events, decoded.
#[derive(Debug, Clone)]
pub enum ShellEvent {
    AuthChanged(AuthState),
    ApiFunctions(Capability),
    PathChanged {
        path: String,
        full_path: Option<String>,
    },
    Navigate {
        path: String,
    },
}

impl ShellEvent {
    pub fn name(&self) -> EventName {
        match self {
            ShellEvent::AuthChanged(_) => EventName::AuthChange,
            ShellEvent::ApiFunctions(_) => EventName::ApiFunctions,
            ShellEvent::PathChanged { .. } => EventName::PathChanged,
            ShellEvent::Navigate { .. } => EventName::Navigate,
        }
    }

    /// Decode a raw delivery for `name`.
    ///
    /// A `null` auth payload is read as "signed out".
    pub fn decode(name: EventName, payload: &Payload) -> Result<Self, ContractError> {
        match name {
            EventName::AuthChange => match json_of(name, payload)? {
                Value::Null => Ok(ShellEvent::AuthChanged(AuthState::anonymous())),
                value => Ok(ShellEvent::AuthChanged(serde_json::from_value(value.clone())?)),
            },
            EventName::ApiFunctions => payload
                .as_capability()
                .cloned()
                .map(ShellEvent::ApiFunctions)
                .ok_or_else(|| {
                    ContractError::malformed(format!("{name} expects a capability payload"))
                }),
            EventName::PathChanged => {
                let p: PathChangedPayload =
                    serde_json::from_value(json_of(name, payload)?.clone())?;
                Ok(ShellEvent::PathChanged {
                    path: p.path,
                    full_path: p.full_path,
                })
            }
            EventName::Navigate => {
                let p: NavigationPayload = serde_json::from_value(json_of(name, payload)?.clone())?;
                Ok(ShellEvent::Navigate { path: p.path })
            }
            other => Err(ContractError::malformed(format!(
                "{other} is emitted by the module, not the shell"
            ))),
        }
    }
}

fn json_of(name: EventName, payload: &Payload) -> Result<&Value, ContractError> {
    payload
        .as_json()
        .ok_or_else(|| ContractError::malformed(format!("{name} expects a JSON payload")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_names_match_the_shell_vocabulary() {
        let names: Vec<&str> = EventName::ALL.iter().map(EventName::as_str).collect();
        assert_eq!(
            names,
            vec![
                "micro:loaded",
                "shell:notification",
                "micro:request-auth",
                "micro:request-api-functions",
                "shell:navigation",
                "shell:auth-change",
                "shell:api-functions",
                "shell:path-changed",
                "shell:navigate",
            ]
        );
        for name in EventName::ALL {
            assert_eq!(name.as_str().parse::<EventName>().unwrap(), name);
        }
        assert!("micro:loadd".parse::<EventName>().is_err());
    }

    #[test]
    fn module_events_carry_their_direction() {
        let outbound = [
            ModuleEvent::Loaded { name: "x".into() },
            ModuleEvent::Notification {
                level: NotificationLevel::Info,
                message: "m".into(),
            },
            ModuleEvent::RequestAuth,
            ModuleEvent::RequestApiFunctions,
            ModuleEvent::Navigation { path: "/".into() },
        ];
        for ev in outbound {
            assert_eq!(ev.name().direction(), Direction::ModuleToShell);
        }
    }

    #[test]
    fn notification_payload_uses_type_field() {
        let ev = ModuleEvent::Notification {
            level: NotificationLevel::Success,
            message: "Micro App Demo loaded successfully!".into(),
        };
        assert_eq!(
            ev.payload().as_json().cloned(),
            Some(json!({ "type": "success", "message": "Micro App Demo loaded successfully!" }))
        );
    }

    #[test]
    fn request_events_send_empty_object() {
        assert_eq!(ModuleEvent::RequestAuth.payload().as_json(), Some(&json!({})));
        assert_eq!(
            ModuleEvent::RequestApiFunctions.payload().as_json(),
            Some(&json!({}))
        );
    }

    #[test]
    fn decodes_path_changed_with_optional_full_path() {
        let ev = ShellEvent::decode(
            EventName::PathChanged,
            &Payload::Json(json!({
                "path": "/customers",
                "fullPath": "/micro-app-demo/customers"
            })),
        )
        .unwrap();
        match ev {
            ShellEvent::PathChanged { path, full_path } => {
                assert_eq!(path, "/customers");
                assert_eq!(full_path.as_deref(), Some("/micro-app-demo/customers"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let ev = ShellEvent::decode(EventName::PathChanged, &Payload::Json(json!({ "path": "/" })))
            .unwrap();
        assert!(matches!(ev, ShellEvent::PathChanged { full_path: None, .. }));
    }

    #[test]
    fn null_auth_change_means_signed_out() {
        let ev = ShellEvent::decode(EventName::AuthChange, &Payload::Json(Value::Null)).unwrap();
        match ev {
            ShellEvent::AuthChanged(state) => assert_eq!(state, AuthState::anonymous()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_mismatched_payload_kinds() {
        let err = ShellEvent::decode(EventName::ApiFunctions, &Payload::empty()).unwrap_err();
        assert!(matches!(err, ContractError::MalformedPayload(_)));

        let err = ShellEvent::decode(
            EventName::AuthChange,
            &Payload::Capability(Capability::new(1u8)),
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::MalformedPayload(_)));

        let err = ShellEvent::decode(EventName::Navigate, &Payload::Json(json!({ "to": "/x" })))
            .unwrap_err();
        assert!(matches!(err, ContractError::MalformedPayload(_)));
    }

    #[test]
    fn refuses_to_decode_module_events() {
        assert!(ShellEvent::decode(EventName::Loaded, &Payload::empty()).is_err());
    }
}
