//! Tester configuration and lifecycle.
//!
//! # Example
//!
//! ```no_run
//! use fbp_conformance::{Tester, TesterOptions};
//!
//! # async fn example() -> fbp_conformance::Result<()> {
//! let mut tester = Tester::builder()
//!     .options(TesterOptions::new().with_secret_from_env())
//!     .build()?;
//!
//! tester.connect().await?;
//! tester.request_runtime().await?;
//! tester.require_capability("protocol:graph")?;
//! tester.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | Fluent [`TesterBuilder`] |
//! | `core` | [`Tester`] and [`RuntimeInfo`] |
//! | `options` | [`TesterOptions`] |

// ============================================================================
// Submodules
// ============================================================================

/// Builder pattern for tester configuration.
pub mod builder;

/// Core tester implementation.
pub mod core;

/// Connection, timing and fixture settings.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::TesterBuilder;
pub use core::{RuntimeInfo, Tester};
pub use options::{DEFAULT_SUBPROTOCOL, SECRET_ENV_VAR, TesterOptions};
