//! Suite results.

// ============================================================================
// Imports
// ============================================================================

use std::fmt::Write as _;

use serde::Serialize;

use crate::tester::RuntimeInfo;

use super::case::Category;

// ============================================================================
// CaseOutcome
// ============================================================================

/// Pass/fail state of one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Every step succeeded.
    Passed,
    /// A step failed.
    Failed,
}

/// Result of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseOutcome {
    /// Dotted case name.
    pub name: String,
    /// Protocol area.
    pub category: Category,
    /// What the runtime should do.
    pub description: String,
    /// Pass/fail state.
    pub status: Status,
    /// First failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock duration.
    pub elapsed_ms: u64,
}

impl CaseOutcome {
    /// Returns `true` if the case passed.
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == Status::Passed
    }
}

// ============================================================================
// SuiteReport
// ============================================================================

/// Results of a suite run, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuiteReport {
    /// Runtime type label from the options.
    pub runtime_type: String,
    /// Protocol version, `major.minor.patch`.
    pub version: String,
    /// Runtime address.
    pub address: String,
    /// Metadata reported by the runtime, if requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeInfo>,
    /// One entry per selected case.
    pub outcomes: Vec<CaseOutcome>,
}

impl SuiteReport {
    /// Number of passed cases.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    /// Number of failed cases.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    /// Returns `true` if every case passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(CaseOutcome::passed)
    }

    /// Renders a human-readable summary.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} runtime, protocol {} at {}",
            self.runtime_type, self.version, self.address
        );

        let mut category = None;
        for outcome in &self.outcomes {
            if category != Some(outcome.category) {
                category = Some(outcome.category);
                let _ = writeln!(out, "\n  {}", outcome.category);
            }
            let mark = if outcome.passed() { "ok  " } else { "FAIL" };
            let _ = writeln!(
                out,
                "    {mark} {} ({} ms)",
                outcome.description, outcome.elapsed_ms
            );
            if let Some(error) = &outcome.error {
                let _ = writeln!(out, "         {error}");
            }
        }

        let _ = writeln!(
            out,
            "\n  {} passing, {} failing",
            self.passed(),
            self.failed()
        );
        out
    }
}

// ============================================================================
// Tests
// ============================================================================
