//! WebSocket transport layer.
//!
//! This module handles communication between the conformance engine and
//! the runtime under test.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Tester (Rust)  │                              │  Runtime under  │
//! │                 │    WebSocket, "noflo"        │  test           │
//! │  Supervisor     │─────────────────────────────►│                 │
//! │  → Connection   │◄─────────────────────────────│  WebSocket      │
//! │                 │      ws://host:port/         │  Server         │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Supervisor::connect` - Dial with bounded retry
//! 2. `Connection` - Send commands, receive frames in arrival order
//! 3. `Supervisor::teardown` - Close gracefully at suite end
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |
//! | `supervisor` | Retrying connect and teardown |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// Connection supervisor.
pub mod supervisor;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Capabilities, Connection, ConnectionState};
pub use supervisor::{RetryPolicy, Supervisor, connect_with_retry};
