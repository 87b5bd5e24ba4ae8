//! Built-in validator for the shared message envelope.
//!
//! Checks only what every output schema has in common: the message is an
//! object with string `protocol` and `command`, an object `payload`, no
//! other top-level fields besides `requestId`, and protocol/command that
//! agree with the schema identifier. Per-command payload shapes need the
//! external schema catalog.

use serde_json::Value;

use super::{SchemaValidator, Validation};

/// Top-level fields permitted by the shared envelope.
const ENVELOPE_FIELDS: &[&str] = &["protocol", "command", "payload", "requestId"];

/// Structural validator for the message envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeValidator;

impl EnvelopeValidator {
    /// Splits `{protocol}/output/{command}` into its parts.
    ///
    /// A leading `/` is accepted.
    fn parse_schema_id(schema_id: &str) -> Option<(&str, &str)> {
        let mut parts = schema_id.trim_start_matches('/').split('/');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(protocol), Some("output"), Some(command), None)
                if !protocol.is_empty() && !command.is_empty() =>
            {
                Some((protocol, command))
            }
            _ => None,
        }
    }
}

impl SchemaValidator for EnvelopeValidator {
    fn validate(&self, message: &Value, schema_id: &str) -> Validation {
        let Some((protocol, command)) = Self::parse_schema_id(schema_id) else {
            return Validation::invalid(vec![format!("unknown schema {schema_id}")]);
        };

        let Some(object) = message.as_object() else {
            return Validation::invalid(vec!["message is not an object".into()]);
        };

        let mut errors = Vec::new();

        match object.get("protocol").and_then(Value::as_str) {
            Some(actual) if actual == protocol => {}
            Some(actual) => errors.push(format!("protocol {actual} does not match {protocol}")),
            None => errors.push("missing string field protocol".into()),
        }

        match object.get("command").and_then(Value::as_str) {
            Some(actual) if actual == command => {}
            Some(actual) => errors.push(format!("command {actual} does not match {command}")),
            None => errors.push("missing string field command".into()),
        }

        if !object.get("payload").is_some_and(Value::is_object) {
            errors.push("payload must be an object".into());
        }

        if let Some(request_id) = object.get("requestId")
            && !request_id.is_string()
        {
            errors.push("requestId must be a string".into());
        }

        errors.extend(
            object
                .keys()
                .filter(|key| !ENVELOPE_FIELDS.contains(&key.as_str()))
                .map(|key| format!("additional property {key} not allowed")),
        );

        Validation::from_errors(errors)
    }
}
