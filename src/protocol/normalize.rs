//! Removal of non-deterministic payload fields.
//!
//! Some fields can't be compared with deep equality: timestamps, uptimes,
//! running flags and stack traces. They have already passed schema
//! validation, so they are dropped from both sides before comparing.
//!
//! | Message | Dropped fields |
//! |---------|----------------|
//! | `network/started` | `time`, `running` |
//! | `network/stopped` | `time`, `uptime` |
//! | `*/error` | `stack` |

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use super::message::Payload;

// ============================================================================
// Constants
// ============================================================================

/// Field carrying the shared secret, outbound only.
pub const SECRET_FIELD: &str = "secret";

/// Volatile fields for one protocol/command pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolatileRule {
    /// Protocol the rule applies to; `None` matches any protocol.
    pub protocol: Option<&'static str>,
    /// Command the rule applies to.
    pub command: &'static str,
    /// Fields removed before comparison.
    pub fields: &'static [&'static str],
}

impl VolatileRule {
    /// Returns `true` if the rule applies to the given message type.
    #[inline]
    #[must_use]
    pub fn applies_to(&self, protocol: &str, command: &str) -> bool {
        self.command == command && self.protocol.is_none_or(|p| p == protocol)
    }
}

/// The fixed normalization rule set.
pub const VOLATILE_FIELDS: &[VolatileRule] = &[
    VolatileRule {
        protocol: Some("network"),
        command: "started",
        fields: &["time", "running"],
    },
    VolatileRule {
        protocol: Some("network"),
        command: "stopped",
        fields: &["time", "uptime"],
    },
    VolatileRule {
        protocol: None,
        command: "error",
        fields: &["stack"],
    },
];

// ============================================================================
// Normalization
// ============================================================================

/// Removes volatile fields and any `secret` from a payload in place.
///
/// Applying it twice is the same as applying it once.
pub fn normalize(protocol: &str, command: &str, payload: &mut Payload) {
    for rule in VOLATILE_FIELDS
        .iter()
        .filter(|rule| rule.applies_to(protocol, command))
    {
        for field in rule.fields {
            payload.remove(*field);
        }
    }
    payload.remove(SECRET_FIELD);
}

/// Deep structural equality of two JSON values.
///
/// Numbers compare by value, so `5` equals `5.0`. Object key order is
/// irrelevant, array order is not.
#[must_use]
pub fn payload_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x == y || matches!((x.as_f64(), y.as_f64()), (Some(p), Some(q)) if p == q)
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| payload_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| payload_eq(x, y)))
        }
        _ => a == b,
    }
}

// ============================================================================
// Tests
// ============================================================================
