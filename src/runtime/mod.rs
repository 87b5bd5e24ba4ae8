//! Runtime-under-test lifecycle.
//!
//! When a start command is configured the runtime is launched through the
//! platform shell and stopped at suite end. Without one it is assumed to
//! be running already.

/// Child process supervision.
pub mod process;

pub use process::{DEFAULT_STARTUP_TIMEOUT, RuntimeProcess, SETTLE_DELAY};
