//! Network protocol cases.
//!
//! A fresh graph `bar` (`Hello` repeating into `World` with an IIP) is set
//! up once before the first case, then started, inspected and stopped.

// ============================================================================
// Imports
// ============================================================================

use serde_json::json;

use crate::protocol::Command;
use crate::scenario::Scenario;
use crate::tester::TesterOptions;

use super::case::{Case, Category, Group, Step};

// ============================================================================
// Catalog
// ============================================================================

/// Returns the network group.
#[must_use]
pub fn group(options: &TesterOptions) -> Group {
    Group::new(
        Category::Network,
        vec![started(), status_started(), stopped(), status_stopped()],
    )
    .with_setup(vec![setup(options)])
}

/// Builds graph `bar` and consumes one reply per command.
fn setup(options: &TesterOptions) -> Step {
    let commands = vec![
        Command::new(
            "graph",
            "clear",
            json!({
                "baseDir": options.resolved_base_dir().display().to_string(),
                "id": "bar",
                "main": true
            }),
        ),
        Command::new(
            "graph",
            "addnode",
            json!({
                "id": "Hello",
                "component": options.component("Repeat"),
                "metadata": {},
                "graph": "bar"
            }),
        ),
        Command::new(
            "graph",
            "addnode",
            json!({
                "id": "World",
                "component": options.component("Drop"),
                "metadata": {},
                "graph": "bar"
            }),
        ),
        Command::new(
            "graph",
            "addedge",
            json!({
                "src": {"node": "Hello", "port": "out"},
                "tgt": {"node": "World", "port": "in"},
                "graph": "bar"
            }),
        ),
        Command::new(
            "graph",
            "addinitial",
            json!({
                "src": {"data": "Hello, world!"},
                "tgt": {"node": "Hello", "port": "in"},
                "graph": "bar"
            }),
        ),
    ];

    Step::Drain {
        count: commands.len(),
        commands,
    }
}

fn case(slug: &str, description: &'static str) -> Case {
    Case::new(Category::Network, slug, description)
}

fn started() -> Case {
    case(
        "starting",
        "starting the network should process the nodes and stop when it completes",
    )
    .scenario(
        Scenario::new("network.start")
            .expect(
                "network",
                "started",
                json!({"graph": "bar", "started": true, "running": true}),
            )
            .expect(
                "network",
                "data",
                json!({
                    "id": "DATA -> IN Hello()",
                    "graph": "bar",
                    "tgt": {"node": "Hello", "port": "in"},
                    "data": "Hello, world!"
                }),
            )
            .expect(
                "network",
                "data",
                json!({
                    "id": "Hello() OUT -> IN World()",
                    "graph": "bar",
                    "src": {"node": "Hello", "port": "out"},
                    "tgt": {"node": "World", "port": "in"},
                    "data": "Hello, world!"
                }),
            )
            .send("network", "start", json!({"graph": "bar"}))
            .tolerate_extra(),
    )
}

fn status(slug: &str, description: &'static str, started: bool) -> Case {
    case(slug, description).scenario(
        Scenario::new(format!("network.{slug}"))
            .expect(
                "network",
                "status",
                json!({"graph": "bar", "running": false, "started": started}),
            )
            .send("network", "getstatus", json!({"graph": "bar"}))
            .tolerate_extra(),
    )
}

fn status_started() -> Case {
    status(
        "status_after_start",
        "starting the network should provide a 'started' status",
        true,
    )
}

fn stopped() -> Case {
    case("stopping", "stopping the network should be stopped").scenario(
        Scenario::new("network.stop")
            .expect(
                "network",
                "stopped",
                json!({"graph": "bar", "running": false, "started": false}),
            )
            .send("network", "stop", json!({"graph": "bar"}))
            .tolerate_extra(),
    )
}

fn status_stopped() -> Case {
    status(
        "status_after_stop",
        "stopping the network should provide a 'stopped' status",
        false,
    )
}

// ============================================================================
// Tests
// ============================================================================
