//! Scenario definitions.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::protocol::{Command, Expectation};

// ============================================================================
// Scenario
// ============================================================================

/// One named conformance check: commands to send and the ordered
/// messages expected in reply.
///
/// # Example
///
/// ```
/// use fbp_conformance::Scenario;
/// use serde_json::json;
///
/// let scenario = Scenario::new("graph.clear")
///     .expect("graph", "clear", json!({"id": "foo", "main": true}))
///     .send("graph", "clear", json!({"id": "foo", "main": true}))
///     .tolerate_extra();
///
/// assert_eq!(scenario.expectations().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    expectations: Vec<Expectation>,
    commands: Vec<Command>,
    tolerate_extra: bool,
    timeout: Option<Duration>,
}

impl Scenario {
    /// Creates an empty scenario.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expectations: Vec::new(),
            commands: Vec::new(),
            tolerate_extra: false,
            timeout: None,
        }
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    /// Appends an expected inbound message.
    #[must_use]
    pub fn expect(self, protocol: &str, command: &str, payload: Value) -> Self {
        self.expectation(Expectation::new(protocol, command, payload))
    }

    /// Appends a prepared expectation.
    #[must_use]
    pub fn expectation(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }

    /// Appends an outbound command, sent in order once the scenario is armed.
    #[must_use]
    pub fn send(self, protocol: &str, command: &str, payload: Value) -> Self {
        self.command(Command::new(protocol, command, payload))
    }

    /// Appends a prepared command.
    #[must_use]
    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Skips messages that don't match the front expectation.
    #[must_use]
    pub fn tolerate_extra(self) -> Self {
        self.with_tolerate_extra(true)
    }

    /// Sets tolerate-extra mode explicitly.
    #[must_use]
    pub fn with_tolerate_extra(mut self, tolerate: bool) -> Self {
        self.tolerate_extra = tolerate;
        self
    }

    /// Overrides the driver's default timeout for this scenario.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the scenario name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the expectations in matching order.
    #[inline]
    #[must_use]
    pub fn expectations(&self) -> &[Expectation] {
        &self.expectations
    }

    /// Returns the commands in sending order.
    #[inline]
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Returns `true` if extra messages are skipped.
    #[inline]
    #[must_use]
    pub fn tolerates_extra(&self) -> bool {
        self.tolerate_extra
    }

    /// Returns the per-scenario timeout override.
    #[inline]
    #[must_use]
    pub fn timeout_override(&self) -> Option<Duration> {
        self.timeout
    }

    /// Checks the scenario can complete.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no expectation is armed.
    pub fn validate(&self) -> Result<()> {
        if self.expectations.is_empty() {
            return Err(Error::config(format!(
                "Scenario {:?} has no expectations",
                self.name
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
