//! Boundary parsing of the loosely typed record object.
//!
//! Parents send records with optional, sometimes mistyped fields. All
//! defaults are applied here, once, so handlers only ever see a complete
//! [`Record`].

use serde_json::{Map, Value};

use crate::store::Record;

use super::errors::ActionError;

/// Key of the nested record object in `store` messages.
pub(crate) const RECORD_KEY: &str = "tweet";

/// Builds a [`Record`] from the nested record value of a `store` message.
///
/// # Errors
///
/// Returns [`ActionError::MissingField`] when `value` is absent and
/// [`ActionError::InvalidField`] when it, or one of its fields, has a type
/// that cannot be stored.
pub fn record_from_value(value: Option<&Value>) -> Result<Record, ActionError> {
    let fields = match value {
        Some(Value::Object(fields)) => fields,
        Some(_) => return Err(ActionError::invalid_field(RECORD_KEY, "expected an object")),
        None => return Err(ActionError::missing_field(RECORD_KEY)),
    };

    Ok(Record {
        originator_id: text_field(fields, "originator_id")?,
        timestamp: text_field(fields, "timestamp")?,
        record_type: text_field(fields, "type")?,
        data: data_field(fields),
        user_id: text_field(fields, "user_id")?,
        can_send_to_ca: flag_field(fields, "canSendToCA")?,
        reason: reason_field(fields)?,
        date_added: text_field(fields, "date_added")?,
    })
}

/// Missing and null become `""`; scalars keep their JSON text.
fn text_field(fields: &Map<String, Value>, name: &'static str) -> Result<String, ActionError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(scalar @ (Value::Number(_) | Value::Bool(_))) => Ok(scalar.to_string()),
        Some(Value::Array(_) | Value::Object(_)) => {
            Err(ActionError::invalid_field(name, "expected text"))
        }
    }
}

/// Strings are stored verbatim and objects are always re-serialized. Other
/// falsy payloads (`false`, zero, an empty array) count as missing.
fn data_field(fields: &Map<String, Value>) -> String {
    match fields.get("data") {
        None | Some(Value::Null | Value::Bool(false)) => String::new(),
        Some(Value::Number(number)) if number.as_f64() == Some(0.0) => String::new(),
        Some(Value::Array(items)) if items.is_empty() => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn flag_field(fields: &Map<String, Value>, name: &'static str) -> Result<Option<bool>, ActionError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(_) => Err(ActionError::invalid_field(name, "expected a boolean")),
    }
}

/// An empty reason is never stored.
fn reason_field(fields: &Map<String, Value>) -> Result<Option<String>, ActionError> {
    let reason = text_field(fields, "reason")?;
    Ok((!reason.is_empty()).then_some(reason))
}
