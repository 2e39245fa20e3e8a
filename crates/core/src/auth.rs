//! Authentication state as owned by the shell.
//!
//! The module only ever holds a read-only copy of this value. Field names on
//! the wire are camelCase and must match the shell's shape exactly.

use serde::{Deserialize, Serialize};

/// The signed-in user, as described by the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Authentication snapshot pushed by the shell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub is_authenticated: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl AuthState {
    /// State used when the shell has not (yet) told us anything.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: impl Into<String>, user: User) -> Self {
        Self {
            is_authenticated: true,
            token: Some(token.into()),
            refresh_token: None,
            user: Some(user),
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Name shown in the greeting, if there is a user to greet.
    pub fn display_name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dev_user() -> User {
        User {
            id: "dev-user".to_string(),
            name: "Developer".to_string(),
            email: "dev@example.com".to_string(),
            roles: vec!["developer".to_string()],
        }
    }

    #[test]
    fn decodes_shell_payload_with_camel_case_fields() {
        let payload = json!({
            "isAuthenticated": true,
            "token": "t-1",
            "refreshToken": "r-1",
            "user": {
                "id": "dev-user",
                "name": "Developer",
                "email": "dev@example.com",
                "roles": ["developer"]
            }
        });

        let state: AuthState = serde_json::from_value(payload).unwrap();
        assert!(state.is_authenticated);
        assert_eq!(state.token.as_deref(), Some("t-1"));
        assert_eq!(state.refresh_token.as_deref(), Some("r-1"));
        assert_eq!(state.user, Some(dev_user()));
    }

    #[test]
    fn decodes_null_tokens_and_missing_user() {
        let payload = json!({ "isAuthenticated": false, "token": null, "refreshToken": null });
        let state: AuthState = serde_json::from_value(payload).unwrap();
        assert_eq!(state, AuthState::anonymous());
        assert!(state.display_name().is_none());
    }
}
