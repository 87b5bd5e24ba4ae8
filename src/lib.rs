//! FBP protocol conformance engine.
//!
//! Drives a flow-based-programming runtime over its JSON-over-WebSocket
//! protocol and checks that it answers each command with the expected
//! messages.
//!
//! # Architecture
//!
//! - **Transport**: one WebSocket connection (subprotocol `noflo`), opened
//!   with bounded retry and shared by every scenario of a run
//! - **Codec**: attaches the shared secret outbound, strips it inbound
//! - **Schema gate**: every inbound message is validated before matching
//! - **Matcher**: ordered expectation queue with tolerate-extra mode
//! - **Driver**: sends a scenario's commands and enforces its time budget
//!
//! # Quick Start
//!
//! ```no_run
//! use fbp_conformance::{Result, Scenario, Tester, TesterOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut tester = Tester::builder()
//!         .options(TesterOptions::new().with_port(3569).with_secret_from_env())
//!         .build()?;
//!
//!     tester.connect().await?;
//!     tester.request_runtime().await?;
//!     tester.require_capability("protocol:graph")?;
//!
//!     let scenario = Scenario::new("graph.clear")
//!         .expect("graph", "clear", json!({"id": "foo", "main": true}))
//!         .send("graph", "clear", json!({"id": "foo", "main": true}))
//!         .tolerate_extra();
//!     tester.run(&scenario).await?;
//!
//!     tester.close().await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Message types, codec and normalization |
//! | [`runtime`] | Runtime process lifecycle |
//! | [`scenario`] | Scenarios, matcher and driver |
//! | [`schema`] | Schema validation seam |
//! | [`suite`] | The conformance catalog and runner |
//! | [`tester`] | Tester configuration and lifecycle |
//! | [`transport`] | WebSocket transport layer |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Protocol message types.
///
/// Envelopes, the wire codec and payload normalization.
pub mod protocol;

/// Runtime-under-test process lifecycle.
pub mod runtime;

/// Scenario definition, matching and driving.
pub mod scenario;

/// Schema validation seam.
pub mod schema;

/// Conformance catalog and runner.
pub mod suite;

/// Tester configuration and lifecycle.
///
/// Use [`Tester::builder()`] to create a configured tester.
pub mod tester;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{Codec, Command, Expectation, Message, Payload};

// Runtime types
pub use runtime::RuntimeProcess;

// Scenario types
pub use scenario::{Matcher, Scenario, ScenarioDriver, Verdict};

// Schema types
pub use schema::{EnvelopeValidator, SchemaGate, SchemaValidator, Validation};

// Suite types
pub use suite::{CaseFilter, CaseOutcome, Category, ConformanceSuite, SuiteReport};

// Tester types
pub use tester::{RuntimeInfo, Tester, TesterBuilder, TesterOptions};

// Transport types
pub use transport::{Connection, ConnectionState, RetryPolicy, Supervisor};
