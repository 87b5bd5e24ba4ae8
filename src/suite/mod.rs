//! The FBP protocol conformance catalog.
//!
//! Cases run in catalog order over one connection, and later cases rely on
//! state built by earlier ones (graph `foo` for the graph cases, graph
//! `bar` for the network cases).
//!
//! | Group | Capability | Cases |
//! |-------|------------|-------|
//! | `runtime` | none | metadata |
//! | `graph` | `protocol:graph` | nodes, edges, metadata, IIPs, exported ports, errors |
//! | `network` | `protocol:network` | start, status, stop |
//! | `component` | `protocol:component` | component listing |
//!
//! # Example
//!
//! ```no_run
//! use fbp_conformance::{CaseFilter, ConformanceSuite, TesterOptions};
//!
//! # async fn example() -> fbp_conformance::Result<()> {
//! let suite = ConformanceSuite::new(TesterOptions::new().with_port(3569));
//! let report = suite.run(&CaseFilter::all()).await?;
//! print!("{}", report.render_text());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Case model.
pub mod case;

/// Component protocol cases.
pub mod component;

/// Graph protocol cases.
pub mod graph;

/// Network protocol cases.
pub mod network;

/// Suite results.
pub mod report;

/// Suite runner.
pub mod runner;

/// Runtime protocol cases.
pub mod runtime;

// ============================================================================
// Re-exports
// ============================================================================

pub use case::{Case, Category, Group, Step};
pub use report::{CaseOutcome, Status, SuiteReport};
pub use runner::{CaseFilter, ConformanceSuite};
