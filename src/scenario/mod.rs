//! Scenario definition, matching and driving.
//!
//! A scenario is one named check: commands to send and the ordered list
//! of messages the runtime must answer with.
//!
//! # Lifecycle
//!
//! ```text
//! Scenario ──► ScenarioDriver::run
//!                 │  arm Matcher
//!                 │  send commands
//!                 ▼
//!            recv frame ─► Codec::decode ─► SchemaGate::check ─► Matcher
//!                 ▲                                                 │
//!                 └──────────── Pending / Ignored ◄─────────────────┤
//!                                                   Complete / Err ─┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `definition` | [`Scenario`] builder |
//! | `matcher` | Expectation queue state machine |
//! | `driver` | Sends, receives and enforces the time budget |

// ============================================================================
// Submodules
// ============================================================================

/// Scenario builder.
pub mod definition;

/// Scenario driver.
pub mod driver;

/// Expectation matcher.
pub mod matcher;

// ============================================================================
// Re-exports
// ============================================================================

pub use definition::Scenario;
pub use driver::{DEFAULT_SCENARIO_TIMEOUT, ScenarioDriver};
pub use matcher::{Matcher, Verdict};
