//! Builder pattern for tester configuration.
//!
//! # Example
//!
//! ```
//! use fbp_conformance::{Tester, TesterOptions, Validation};
//!
//! # fn example() -> fbp_conformance::Result<()> {
//! let tester = Tester::builder()
//!     .options(TesterOptions::new().with_port(3569))
//!     .validator(|_: &serde_json::Value, _: &str| Validation::ok())
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::schema::{SchemaGate, SchemaValidator};

use super::core::Tester;
use super::options::TesterOptions;

// ============================================================================
// TesterBuilder
// ============================================================================

/// Builder for configuring a [`Tester`].
///
/// Use [`Tester::builder()`] to create one.
#[derive(Default, Clone)]
pub struct TesterBuilder {
    /// Connection and fixture settings.
    options: TesterOptions,
    /// Schema validator; the envelope validator if unset.
    validator: Option<Arc<dyn SchemaValidator>>,
}

impl fmt::Debug for TesterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TesterBuilder")
            .field("options", &self.options)
            .field("custom_validator", &self.validator.is_some())
            .finish()
    }
}

impl TesterBuilder {
    /// Creates a builder with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: TesterOptions) -> Self {
        self.options = options;
        self
    }

    /// Installs the schema validator every inbound message passes through.
    #[inline]
    #[must_use]
    pub fn validator(mut self, validator: impl SchemaValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Builds the tester.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the options are invalid.
    pub fn build(self) -> Result<Tester> {
        self.options.validate()?;

        let gate = match self.validator {
            Some(validator) => SchemaGate::from_arc(validator),
            None => SchemaGate::default(),
        };

        Tester::new(self.options, gate)
    }
}

// ============================================================================
// Tests
// ============================================================================
