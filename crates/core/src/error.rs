//! Contract error model.

use thiserror::Error;

/// Result type used for contract-level parsing and validation.
pub type ContractResult<T> = Result<T, ContractError>;

/// Failure to interpret a value that crossed the shell/module boundary.
///
/// These are integration problems, not user-facing failures; callers log them
/// and carry on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A closed-set value (event name, level, mode...) was not recognized.
    #[error("unknown {field}: {value:?}")]
    UnknownValue { field: &'static str, value: String },

    /// A payload did not match the expected shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl ContractError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn unknown(field: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownValue {
            field,
            value: value.into(),
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }
}

impl From<serde_json::Error> for ContractError {
    fn from(value: serde_json::Error) -> Self {
        Self::MalformedPayload(value.to_string())
    }
}
