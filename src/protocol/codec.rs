//! Wire codec and secret filter.
//!
//! Outbound, the shared secret is attached twice: at the top level and
//! inside the payload (runtimes older than protocol 0.8 read it from the
//! payload). Inbound, both copies are removed before anything else looks
//! at the message.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use serde_json::{Value, from_str, from_value, to_string};
use tracing::trace;

use crate::error::{Error, Result};

use super::message::{Command, Message, Payload};
use super::normalize::SECRET_FIELD;

// ============================================================================
// Wire Types
// ============================================================================

/// Outbound wire representation.
#[derive(Serialize)]
struct Outbound<'a> {
    protocol: &'a str,
    command: &'a str,
    payload: Payload,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret: Option<&'a str>,
}

// ============================================================================
// Codec
// ============================================================================

/// Serializes outbound commands and sanitizes inbound frames.
///
/// The secret is fixed at construction. An absent secret is valid and
/// leaves the `secret` fields out of the frame entirely.
#[derive(Clone, Default)]
pub struct Codec {
    /// Shared secret attached to every outbound command.
    secret: Option<String>,
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Codec {
    /// Creates a codec with the given shared secret.
    #[inline]
    #[must_use]
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    /// Returns `true` if a secret is configured.
    #[inline]
    #[must_use]
    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Encodes a command as a single text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn encode(&self, command: &Command) -> Result<String> {
        let secret = self.secret.as_deref();

        let mut payload = command.payload.clone();
        if let Some(secret) = secret {
            payload.insert(SECRET_FIELD.into(), Value::String(secret.into()));
        }

        let frame = to_string(&Outbound {
            protocol: &command.protocol,
            command: &command.command,
            payload,
            secret,
        })?;

        trace!(protocol = %command.protocol, command = %command.command, "Encoded command");
        Ok(frame)
    }

    /// Decodes an inbound text frame.
    ///
    /// Removes `secret` from the message and from its payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the frame is not JSON, not an object,
    /// lacks string `protocol`/`command` fields, or has a non-object payload.
    pub fn decode(frame: &str) -> Result<Message> {
        let mut value: Value =
            from_str(frame).map_err(|e| Error::decode(format!("invalid JSON: {e}")))?;

        let object = value
            .as_object_mut()
            .ok_or_else(|| Error::decode("frame is not a JSON object"))?;

        for field in ["protocol", "command"] {
            if !object.get(field).is_some_and(Value::is_string) {
                return Err(Error::decode(format!("missing string field `{field}`")));
            }
        }

        object.remove(SECRET_FIELD);
        if let Some(Value::Object(payload)) = object.get_mut("payload") {
            payload.remove(SECRET_FIELD);
        }

        let message: Message = from_value(value).map_err(|e| Error::decode(e.to_string()))?;
        debug_assert!(!message.extra.contains_key(SECRET_FIELD));
        debug_assert!(!message.payload.contains_key(SECRET_FIELD));

        Ok(message)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    use crate::protocol::object;

    fn parse(frame: &str) -> Value {
        serde_json::from_str(frame).expect("valid json")
    }

    #[test]
    fn test_encode_attaches_secret_twice() {
        let codec = Codec::new(Some("s3cr3t".into()));
        let frame = codec
            .encode(&Command::new("graph", "clear", json!({"id": "foo"})))
            .expect("encode");

        assert_eq!(
            parse(&frame),
            json!({
                "protocol": "graph",
                "command": "clear",
                "payload": {"id": "foo", "secret": "s3cr3t"},
                "secret": "s3cr3t"
            })
        );
    }

    #[test]
    fn test_encode_without_secret_omits_fields() {
        let codec = Codec::default();
        let frame = codec
            .encode(&Command::new("runtime", "getruntime", json!({})))
            .expect("encode");

        let value = parse(&frame);
        assert!(value.get("secret").is_none());
        assert_eq!(value["payload"], json!({}));
    }

    #[test]
    fn test_decode_strips_secret() {
        let message = Codec::decode(
            r#"{"protocol":"graph","command":"clear","payload":{"id":"foo","secret":"x"},"secret":"x"}"#,
        )
        .expect("decode");

        assert_eq!(message.payload, object(json!({"id": "foo"})));
        assert!(!message.extra.contains_key("secret"));
        assert!(message.to_value().get("secret").is_none());
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        let err = Codec::decode("{not json").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(matches!(Codec::decode("[1,2]"), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_decode_requires_string_protocol_and_command() {
        assert!(Codec::decode(r#"{"command":"clear","payload":{}}"#).is_err());
        assert!(Codec::decode(r#"{"protocol":"graph","command":5,"payload":{}}"#).is_err());
    }

    #[test]
    fn test_decode_rejects_non_object_payload() {
        let err = Codec::decode(r#"{"protocol":"graph","command":"clear","payload":"x"}"#)
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let codec = Codec::new(Some("hunter2".into()));
        let debug = format!("{codec:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("redacted"));
    }

    proptest! {
        #[test]
        fn prop_decoded_messages_never_carry_secret(
            secret in "[a-zA-Z0-9]{0,16}",
            key in "[a-z]{1,8}",
            value in any::<i64>(),
        ) {
            let frame = json!({
                "protocol": "graph",
                "command": "addnode",
                "payload": {key.clone(): value, "secret": secret.clone()},
                "secret": secret,
            })
            .to_string();

            let message = Codec::decode(&frame).expect("decode");
            prop_assert!(!message.payload.contains_key("secret"));
            prop_assert!(!message.extra.contains_key("secret"));
        }

        #[test]
        fn prop_encode_then_decode_roundtrips_payload(
            secret in proptest::option::of("[a-z]{1,12}"),
            id in "[A-Za-z0-9]{1,12}",
        ) {
            let codec = Codec::new(secret.clone());
            let command = Command::new("graph", "addnode", json!({"id": id, "graph": "foo"}));
            let frame = codec.encode(&command).expect("encode");

            let observed = parse(&frame);
            prop_assert_eq!(observed["payload"].get("secret").and_then(Value::as_str), secret.as_deref());
            prop_assert_eq!(observed.get("secret").and_then(Value::as_str), secret.as_deref());

            let message = Codec::decode(&frame).expect("decode");
            prop_assert_eq!(message.protocol, "graph");
            prop_assert_eq!(message.command, "addnode");
            prop_assert_eq!(message.payload, command.payload);
        }
    }
}
