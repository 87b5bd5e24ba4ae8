//! Conformance case model.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::protocol::Command;
use crate::scenario::Scenario;

// ============================================================================
// Category
// ============================================================================

/// Protocol area a case exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// `runtime` protocol.
    Runtime,
    /// `graph` protocol.
    Graph,
    /// `network` protocol.
    Network,
    /// `component` protocol.
    Component,
}

impl Category {
    /// All categories in catalog order.
    pub const ALL: [Self; 4] = [Self::Runtime, Self::Graph, Self::Network, Self::Component];

    /// Returns the lowercase name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Runtime => "runtime",
            Self::Graph => "graph",
            Self::Network => "network",
            Self::Component => "component",
        }
    }

    /// Returns the capability the runtime must grant for this category.
    #[inline]
    #[must_use]
    pub const fn capability(self) -> Option<&'static str> {
        match self {
            Self::Runtime => None,
            Self::Graph => Some("protocol:graph"),
            Self::Network => Some("protocol:network"),
            Self::Component => Some("protocol:component"),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown category {s:?}, expected one of runtime, graph, network, component")
            })
    }
}

// ============================================================================
// Step
// ============================================================================

/// One unit of work inside a case.
#[derive(Debug, Clone)]
pub enum Step {
    /// Request runtime metadata and record capabilities.
    RequestRuntime,

    /// Run a scenario.
    Scenario(Scenario),

    /// Send commands, then consume `count` replies without inspecting them.
    Drain {
        /// Commands sent in order.
        commands: Vec<Command>,
        /// Number of replies to consume.
        count: usize,
    },

    /// Request the component list and wait for one component to appear.
    AwaitComponent {
        /// Fully qualified component name.
        component: String,
        /// Time budget for the whole listing.
        budget: Duration,
    },
}

// ============================================================================
// Case
// ============================================================================

/// A named, ordered list of steps.
#[derive(Debug, Clone)]
pub struct Case {
    /// Dotted name, e.g. `graph.adding_an_edge`.
    pub name: String,
    /// Protocol area.
    pub category: Category,
    /// What the runtime should do.
    pub description: &'static str,
    /// Steps, run in order until one fails.
    pub steps: Vec<Step>,
}

impl Case {
    /// Creates a case with no steps.
    #[must_use]
    pub fn new(category: Category, slug: &str, description: &'static str) -> Self {
        Self {
            name: format!("{category}.{slug}"),
            category,
            description,
            steps: Vec::new(),
        }
    }

    /// Appends a step.
    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Appends a scenario step.
    #[must_use]
    pub fn scenario(self, scenario: Scenario) -> Self {
        self.step(Step::Scenario(scenario))
    }
}

// ============================================================================
// Group
// ============================================================================

/// The cases of one category, with shared preconditions.
#[derive(Debug, Clone)]
pub struct Group {
    /// Protocol area.
    pub category: Category,
    /// Steps run once before the first selected case.
    pub setup: Vec<Step>,
    /// Cases in run order.
    pub cases: Vec<Case>,
}

impl Group {
    /// Creates a group without setup steps.
    #[must_use]
    pub fn new(category: Category, cases: Vec<Case>) -> Self {
        Self {
            category,
            setup: Vec::new(),
            cases,
        }
    }

    /// Sets the setup steps.
    #[must_use]
    pub fn with_setup(mut self, setup: Vec<Step>) -> Self {
        self.setup = setup;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
