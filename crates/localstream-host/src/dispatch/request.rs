//! Inbound message parsing.

use serde_json::{Map, Value};

use super::errors::ActionError;

/// A decoded inbound message: an object carrying a string `action`.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    action: String,
    fields: Map<String, Value>,
}

impl InboundMessage {
    /// Validates the message shape.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::NotAnObject`], [`ActionError::MissingAction`]
    /// or [`ActionError::InvalidAction`] when the shape is wrong.
    pub fn parse(value: Value) -> Result<Self, ActionError> {
        let Value::Object(fields) = value else {
            return Err(ActionError::NotAnObject);
        };
        let action = match fields.get("action") {
            Some(Value::String(action)) => action.clone(),
            Some(_) => return Err(ActionError::InvalidAction),
            None => return Err(ActionError::MissingAction),
        };
        Ok(Self { action, fields })
    }

    /// The declared action name.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Looks up an action-specific field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The whole message, `action` included.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}
