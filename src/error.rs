//! Error types for the conformance engine.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use fbp_conformance::{Result, Scenario, Tester};
//!
//! async fn example(tester: &mut Tester, scenario: &Scenario) -> Result<()> {
//!     tester.connect().await?;
//!     tester.run(scenario).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants | Scope |
//! |----------|----------|-------|
//! | Setup | [`Error::Config`], [`Error::Connect`], [`Error::ProcessLaunchFailed`], [`Error::RuntimeExited`] | Whole run |
//! | Scenario | [`Error::Decode`], [`Error::SchemaViolation`], [`Error::UnexpectedRuntimeError`], [`Error::AssertionMismatch`], [`Error::Timeout`] | One scenario |
//! | Suite | [`Error::MissingCapability`] | One protocol group |
//! | Connection | [`Error::ConnectionClosed`], [`Error::WebSocket`] | Connection |
//! | External | [`Error::Io`], [`Error::Json`] | Varies |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use serde_json::Value;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Scenario-level variants terminate only the scenario that produced them;
/// the shared connection stays usable for the next scenario.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Setup Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when tester options or a scenario definition are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Connect retry budget exhausted.
    ///
    /// Carries the last underlying failure. Fatal for the whole run.
    #[error("Failed to connect to {address} after {attempts} attempts: {message}")]
    Connect {
        /// Address that was dialled.
        address: String,
        /// Number of attempts made.
        attempts: u32,
        /// Last underlying failure.
        message: String,
    },

    /// Failed to spawn the runtime under test.
    #[error("Failed to launch runtime: {message}")]
    ProcessLaunchFailed {
        /// Description of the launch failure.
        message: String,
    },

    /// The runtime process exited before signalling readiness.
    #[error("Runtime command exited: {command}")]
    RuntimeExited {
        /// Command line that was spawned.
        command: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection closed.
    ///
    /// Returned when the connection is lost or used after teardown.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Scenario Errors
    // ========================================================================
    /// Inbound frame is not a well-formed protocol message.
    #[error("Malformed frame: {message}")]
    Decode {
        /// What was wrong with the frame.
        message: String,
    },

    /// Inbound message failed schema validation.
    #[error("Message does not conform to {schema}: {}", .errors.join("; "))]
    SchemaViolation {
        /// Schema identifier, `{protocol}/output/{command}`.
        schema: String,
        /// Structured errors reported by the validator.
        errors: Vec<String>,
    },

    /// Runtime reported an error that no expectation anticipated.
    #[error("Runtime reported an unexpected {protocol} error: {payload}")]
    UnexpectedRuntimeError {
        /// Protocol of the error message.
        protocol: String,
        /// Payload of the runtime's error message.
        payload: Value,
    },

    /// Inbound message did not structurally equal the expected one.
    #[error("Expected {expected_schema} {expected} but received {actual_schema} {actual}")]
    AssertionMismatch {
        /// Schema identifier of the expectation.
        expected_schema: String,
        /// Expected payload after normalization.
        expected: Value,
        /// Schema identifier of the received message.
        actual_schema: String,
        /// Received payload after normalization.
        actual: Value,
    },

    /// Operation timeout.
    ///
    /// Returned when a scenario or handshake exceeds its time budget.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Suite Errors
    // ========================================================================
    /// Runtime does not advertise a capability required by a protocol group.
    #[error("Runtime does not advertise capability {capability}")]
    MissingCapability {
        /// Required capability, e.g. `protocol:graph`.
        capability: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connect error.
    #[inline]
    pub fn connect(address: impl Into<String>, attempts: u32, message: impl Into<String>) -> Self {
        Self::Connect {
            address: address.into(),
            attempts,
            message: message.into(),
        }
    }

    /// Creates a process launch failed error.
    #[inline]
    pub fn process_launch_failed(err: IoError) -> Self {
        Self::ProcessLaunchFailed {
            message: err.to_string(),
        }
    }

    /// Creates a runtime exited error.
    #[inline]
    pub fn runtime_exited(command: impl Into<String>) -> Self {
        Self::RuntimeExited {
            command: command.into(),
        }
    }

    /// Creates a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a schema violation error.
    #[inline]
    pub fn schema_violation(schema: impl Into<String>, errors: Vec<String>) -> Self {
        Self::SchemaViolation {
            schema: schema.into(),
            errors,
        }
    }

    /// Creates an unexpected runtime error.
    #[inline]
    pub fn unexpected_runtime_error(protocol: impl Into<String>, payload: Value) -> Self {
        Self::UnexpectedRuntimeError {
            protocol: protocol.into(),
            payload,
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a missing capability error.
    #[inline]
    pub fn missing_capability(capability: impl Into<String>) -> Self {
        Self::MissingCapability {
            capability: capability.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error fails a single scenario only.
    #[inline]
    #[must_use]
    pub fn is_scenario_failure(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. }
                | Self::SchemaViolation { .. }
                | Self::UnexpectedRuntimeError { .. }
                | Self::AssertionMismatch { .. }
                | Self::Timeout { .. }
        )
    }

    /// Returns `true` if this error aborts the whole suite run.
    #[inline]
    #[must_use]
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::Connect { .. }
                | Self::ProcessLaunchFailed { .. }
                | Self::RuntimeExited { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
