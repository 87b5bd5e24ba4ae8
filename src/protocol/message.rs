//! Envelope types shared by outbound commands, inbound messages and
//! expectations.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Payload
// ============================================================================

/// A message payload: always a JSON object.
pub type Payload = Map<String, Value>;

/// Converts a JSON value into a payload.
///
/// Objects are taken as-is; any other value yields an empty payload.
#[inline]
#[must_use]
pub fn object(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

/// Returns the schema identifier for an inbound message.
///
/// Format: `{protocol}/output/{command}`
#[inline]
#[must_use]
pub fn schema_id(protocol: &str, command: &str) -> String {
    format!("{protocol}/output/{command}")
}

// ============================================================================
// Message
// ============================================================================

/// A decoded inbound message.
///
/// There is no `secret` field: the codec removes it before a `Message` is
/// built. Unknown top-level fields are kept in `extra` so schema
/// validation still sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Protocol area, e.g. `graph`.
    pub protocol: String,

    /// Command within the protocol, e.g. `addnode`.
    pub command: String,

    /// Command payload.
    #[serde(default)]
    pub payload: Payload,

    /// Optional request correlation ID.
    #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Any other top-level fields.
    #[serde(flatten)]
    pub extra: Payload,
}

impl Message {
    /// Creates a message with the given envelope and payload.
    #[must_use]
    pub fn new(protocol: impl Into<String>, command: impl Into<String>, payload: Payload) -> Self {
        Self {
            protocol: protocol.into(),
            command: command.into(),
            payload,
            request_id: None,
            extra: Payload::new(),
        }
    }

    /// Returns the schema identifier this message is validated against.
    #[inline]
    #[must_use]
    pub fn schema_id(&self) -> String {
        schema_id(&self.protocol, &self.command)
    }

    /// Returns `true` if the runtime reported an error.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.command == "error"
    }

    /// Returns `true` if protocol and command equal the expectation's.
    #[inline]
    #[must_use]
    pub fn matches(&self, expected: &Expectation) -> bool {
        self.protocol == expected.protocol && self.command == expected.command
    }

    /// Gets a string value from the payload.
    #[inline]
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Converts the message back into the JSON value handed to validators.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut object = self.extra.clone();
        object.insert("protocol".into(), Value::String(self.protocol.clone()));
        object.insert("command".into(), Value::String(self.command.clone()));
        object.insert("payload".into(), Value::Object(self.payload.clone()));
        if let Some(request_id) = &self.request_id {
            object.insert("requestId".into(), Value::String(request_id.clone()));
        }
        Value::Object(object)
    }
}

// ============================================================================
// Expectation
// ============================================================================

/// A pattern describing one anticipated inbound message.
///
/// Matches a [`Message`] whose protocol and command are equal and whose
/// payload is structurally equal after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expectation {
    /// Expected protocol.
    pub protocol: String,
    /// Expected command.
    pub command: String,
    /// Expected payload.
    #[serde(default)]
    pub payload: Payload,
}

impl Expectation {
    /// Creates a new expectation.
    #[must_use]
    pub fn new(protocol: impl Into<String>, command: impl Into<String>, payload: Value) -> Self {
        Self {
            protocol: protocol.into(),
            command: command.into(),
            payload: object(payload),
        }
    }

    /// Returns the schema identifier of the expected message.
    #[inline]
    #[must_use]
    pub fn schema_id(&self) -> String {
        schema_id(&self.protocol, &self.command)
    }

    /// Returns `true` if this expectation anticipates a runtime error.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.command == "error"
    }
}

// ============================================================================
// Command
// ============================================================================

/// An outbound command.
///
/// The shared secret is attached by the [`Codec`](super::Codec), never here.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Target protocol.
    pub protocol: String,
    /// Command name.
    pub command: String,
    /// Command payload.
    pub payload: Payload,
}

impl Command {
    /// Creates a new command.
    #[must_use]
    pub fn new(protocol: impl Into<String>, command: impl Into<String>, payload: Value) -> Self {
        Self {
            protocol: protocol.into(),
            command: command.into(),
            payload: object(payload),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
