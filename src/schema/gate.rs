//! Schema gate: every inbound message passes through here before matching.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::protocol::Message;

use super::{EnvelopeValidator, SchemaValidator};

// ============================================================================
// SchemaGate
// ============================================================================

/// Routes inbound messages through a [`SchemaValidator`].
///
/// Cheap to clone; the validator is shared.
#[derive(Clone)]
pub struct SchemaGate {
    validator: Arc<dyn SchemaValidator>,
}

impl fmt::Debug for SchemaGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaGate").finish_non_exhaustive()
    }
}

impl Default for SchemaGate {
    fn default() -> Self {
        Self::new(EnvelopeValidator)
    }
}

impl SchemaGate {
    /// Creates a gate backed by the given validator.
    #[must_use]
    pub fn new(validator: impl SchemaValidator + 'static) -> Self {
        Self {
            validator: Arc::new(validator),
        }
    }

    /// Creates a gate from an already shared validator.
    #[must_use]
    pub fn from_arc(validator: Arc<dyn SchemaValidator>) -> Self {
        Self { validator }
    }

    /// Validates a message against `{protocol}/output/{command}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaViolation`] with the validator's errors.
    pub fn check(&self, message: &Message) -> Result<()> {
        self.check_as(message, &message.schema_id())
    }

    /// Validates a message against an explicit schema identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaViolation`] with the validator's errors.
    pub fn check_as(&self, message: &Message, schema_id: &str) -> Result<()> {
        let validation = self.validator.validate(&message.to_value(), schema_id);

        if validation.valid && validation.errors.is_empty() {
            trace!(schema = schema_id, "Message passed schema validation");
            return Ok(());
        }

        warn!(
            schema = schema_id,
            errors = ?validation.errors,
            "Message failed schema validation"
        );
        Err(Error::schema_violation(schema_id, validation.errors))
    }
}

// ============================================================================
// Tests
// ============================================================================
