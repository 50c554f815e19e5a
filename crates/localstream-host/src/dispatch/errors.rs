//! Error types for action dispatch failures.
//!
//! Every variant is contained to the message that caused it: the dispatcher
//! renders the `Display` text into an error reply and the session carries on.

use thiserror::Error;

use crate::store::StoreError;
use crate::transport::FrameError;

/// Errors surfaced while interpreting or executing a single action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The frame decoded, but not into a JSON object.
    #[error("message must be a JSON object")]
    NotAnObject,

    /// The message has no `action` key.
    #[error("message has no action")]
    MissingAction,

    /// The `action` key is present but is not a string.
    #[error("action must be a string")]
    InvalidAction,

    /// No handler is registered for the named action.
    #[error("Unknown action: {action}")]
    UnknownAction { action: String },

    /// A field required by the action is absent.
    #[error("missing field '{field}'")]
    MissingField { field: &'static str },

    /// A field is present with a type the action cannot accept.
    #[error("invalid field '{field}': {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    /// A query was requested without a statement.
    #[error("No SQL provided")]
    EmptyQuery,

    /// The frame could not be decoded or exceeded the size limit.
    #[error(transparent)]
    Frame(FrameError),

    /// The store rejected the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ActionError {
    /// Creates an unknown action error.
    pub fn unknown_action(action: impl Into<String>) -> Self {
        Self::UnknownAction {
            action: action.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Creates an invalid field error.
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }

    /// Wraps a per-frame transport failure for reporting to the parent.
    pub fn frame(error: FrameError) -> Self {
        Self::Frame(error)
    }
}
