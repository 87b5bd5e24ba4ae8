//! Schema validation of inbound messages.
//!
//! The schema catalog itself lives outside this crate. Validation is a
//! pure function behind the [`SchemaValidator`] trait:
//! `validate(message, schema_id) -> Validation`.
//!
//! Every inbound message goes through the [`SchemaGate`] keyed by
//! `{protocol}/output/{command}`. A failing message is always fatal for
//! the running scenario, even if it would otherwise have matched.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `envelope` | Built-in validator for the shared message envelope |
//! | `gate` | Routes messages through a validator |

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// Submodules
// ============================================================================

/// Built-in envelope validator.
pub mod envelope;

/// Schema gate.
pub mod gate;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::EnvelopeValidator;
pub use gate::SchemaGate;

// ============================================================================
// Validation
// ============================================================================

/// Outcome of validating one message against one schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    /// Whether the message conforms.
    pub valid: bool,
    /// Structured errors, empty when valid.
    pub errors: Vec<String>,
}

impl Validation {
    /// A passing validation.
    #[inline]
    #[must_use]
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// A failing validation with the given errors.
    #[inline]
    #[must_use]
    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }

    /// Builds a validation from a list of errors: valid iff empty.
    #[inline]
    #[must_use]
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

// ============================================================================
// SchemaValidator
// ============================================================================

/// Validates a message against a schema identifier.
///
/// Implemented for any `Fn(&Value, &str) -> Validation`, so a closure
/// wrapping an external schema library can be plugged in directly.
pub trait SchemaValidator: Send + Sync {
    /// Validates `message` against the schema named `schema_id`.
    fn validate(&self, message: &Value, schema_id: &str) -> Validation;
}

impl<F> SchemaValidator for F
where
    F: Fn(&Value, &str) -> Validation + Send + Sync,
{
    fn validate(&self, message: &Value, schema_id: &str) -> Validation {
        self(message, schema_id)
    }
}

// ============================================================================
// Tests
// ============================================================================
