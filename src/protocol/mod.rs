//! FBP protocol message types.
//!
//! This module defines the JSON envelope exchanged with the runtime under
//! test and the codec that moves it on and off the wire.
//!
//! # Protocol Overview
//!
//! Every message in both directions is a JSON object:
//!
//! ```json
//! {
//!   "protocol": "graph",
//!   "command": "addnode",
//!   "payload": { "id": "Repeat1", "graph": "foo" },
//!   "requestId": "optional",
//!   "secret": "outbound only"
//! }
//! ```
//!
//! | Type | Direction | Purpose |
//! |------|-----------|---------|
//! | [`Command`] | Local → Runtime | Outbound command |
//! | [`Message`] | Runtime → Local | Decoded, secret-free inbound message |
//! | [`Expectation`] | n/a | Pattern a [`Message`] must match |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `codec` | Encoding with the shared secret, decoding with secret stripping |
//! | `message` | Envelope types and schema identifiers |
//! | `normalize` | Removal of non-deterministic payload fields |

// ============================================================================
// Submodules
// ============================================================================

/// Wire codec and secret filter.
pub mod codec;

/// Envelope types.
pub mod message;

/// Payload normalization before comparison.
pub mod normalize;

// ============================================================================
// Re-exports
// ============================================================================

pub use codec::Codec;
pub use message::{Command, Expectation, Message, Payload, object, schema_id};
pub use normalize::{SECRET_FIELD, VOLATILE_FIELDS, VolatileRule, normalize, payload_eq};
