//! Error taxonomy surfaced to call sites.

use serde::Serialize;
use thiserror::Error;

use crate::request::ApiFunction;

pub type ApiResult<T = serde_json::Value> = Result<T, ApiError>;

/// User-facing text for an expired or rejected session.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// User-facing text when the shell's HTTP stack fails before any request is sent.
pub const CONNECTION_ERROR_MESSAGE: &str = "Could not connect to the API. Please try again later.";

/// Marker of a shell whose dialog host was not ready when the call was made.
const SHELL_UI_NOT_READY: &str = "Modal instance is not set";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    NotImplemented,
    Unauthenticated,
    Transport,
}

/// Failure of a call made through the injected API functions.
///
/// Shell-provided functions report failures as [`ApiError::Transport`]
/// (optionally with the HTTP status); [`ApiClient`](crate::ApiClient)
/// translates a 401 into [`ApiError::Unauthenticated`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No real implementation has been injected yet.
    #[error("{function} not implemented")]
    NotImplemented { function: ApiFunction },

    #[error("{message}")]
    Unauthenticated { message: String },

    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },
}

impl ApiError {
    pub fn not_implemented(function: ApiFunction) -> Self {
        Self::NotImplemented { function }
    }

    /// Failure without an HTTP status (network down, aborted, ...).
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Failure carrying the HTTP status returned by the backend.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn session_expired() -> Self {
        Self::Unauthenticated {
            message: SESSION_EXPIRED_MESSAGE.to_string(),
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::NotImplemented { .. } => ApiErrorKind::NotImplemented,
            ApiError::Unauthenticated { .. } => ApiErrorKind::Unauthenticated,
            ApiError::Transport { .. } => ApiErrorKind::Transport,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport { status, .. } => *status,
            ApiError::Unauthenticated { .. } => Some(401),
            ApiError::NotImplemented { .. } => None,
        }
    }

    /// Map a raw failure from a shell function onto the module's taxonomy.
    pub(crate) fn translate(self, function: ApiFunction) -> Self {
        match self {
            ApiError::Transport { message, .. } if message.contains(SHELL_UI_NOT_READY) => {
                tracing::warn!(%function, %message, "shell UI error intercepted");
                ApiError::transport(CONNECTION_ERROR_MESSAGE)
            }
            ApiError::Transport {
                status: Some(401),
                message,
            } => {
                tracing::warn!(%function, %message, "authentication error");
                ApiError::session_expired()
            }
            ApiError::Transport { status, message } => {
                tracing::error!(%function, ?status, %message, "API call error");
                ApiError::Transport { status, message }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_401_into_session_expired() {
        let err = ApiError::http(401, "Unauthorized").translate(ApiFunction::GetRequest);
        assert_eq!(err.kind(), ApiErrorKind::Unauthenticated);
        assert_eq!(err.to_string(), SESSION_EXPIRED_MESSAGE);
    }

    #[test]
    fn passes_other_failures_through_with_their_message() {
        let err = ApiError::http(500, "boom").translate(ApiFunction::PostRequest);
        assert_eq!(err, ApiError::http(500, "boom"));
        assert_eq!(err.to_string(), "boom");

        let err = ApiError::transport("network down").translate(ApiFunction::PutRequest);
        assert_eq!(err.status(), None);
        assert_eq!(err.kind(), ApiErrorKind::Transport);
    }

    #[test]
    fn shell_ui_failures_become_a_connection_error() {
        let raw = ApiError::http(401, "Error: Modal instance is not set");
        let err = raw.translate(ApiFunction::GetRequest);
        assert_eq!(err, ApiError::transport(CONNECTION_ERROR_MESSAGE));

        let err = ApiError::transport("Modal instance is not set")
            .translate(ApiFunction::PostRequest);
        assert_eq!(err.kind(), ApiErrorKind::Transport);
        assert_eq!(err.to_string(), CONNECTION_ERROR_MESSAGE);
    }

    #[test]
    fn not_implemented_names_the_function() {
        let err = ApiError::not_implemented(ApiFunction::DeleteRequest)
            .translate(ApiFunction::DeleteRequest);
        assert_eq!(err.kind(), ApiErrorKind::NotImplemented);
        assert_eq!(err.to_string(), "deleteRequest not implemented");
    }
}
