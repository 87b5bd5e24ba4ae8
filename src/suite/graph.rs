//! Graph protocol cases.
//!
//! The cases share graph `foo` and build on each other: nodes added by the
//! first case are connected, annotated, renamed and exported by later ones.

// ============================================================================
// Imports
// ============================================================================

use serde_json::json;

use crate::scenario::Scenario;
use crate::tester::TesterOptions;

use super::case::{Case, Category, Group};

// ============================================================================
// Catalog
// ============================================================================

/// Returns the graph group.
#[must_use]
pub fn group(options: &TesterOptions) -> Group {
    Group::new(
        Category::Graph,
        vec![
            graph_and_nodes(options),
            edge(),
            metadata_added(),
            metadata_merged(),
            metadata_unchanged(),
            metadata_removed(),
            initial_added(),
            node_removed(),
            initial_removed(),
            node_renamed(),
            node_in_missing_graph(options),
            node_without_graph(options),
            inport_added(),
            outport_added(),
            outport_removed(),
        ],
    )
}

fn case(slug: &str, description: &'static str) -> Case {
    Case::new(Category::Graph, slug, description)
}

fn scenario(name: &str) -> Scenario {
    Scenario::new(format!("graph.{name}")).tolerate_extra()
}

/// Sends `payload` and expects it echoed back.
fn echo(name: &str, command: &str, payload: serde_json::Value) -> Scenario {
    scenario(name)
        .expect("graph", command, payload.clone())
        .send("graph", command, payload)
}

fn graph_and_nodes(options: &TesterOptions) -> Case {
    let repeat = json!({
        "id": "Repeat1",
        "component": options.component("Repeat"),
        "metadata": {"hello": "World"},
        "graph": "foo"
    });
    let drop = json!({
        "id": "Drop1",
        "component": options.component("Drop"),
        "metadata": {},
        "graph": "foo"
    });

    case(
        "adding_a_graph_and_nodes",
        "adding a graph and nodes should provide the nodes back",
    )
    .scenario(
        scenario("clear")
            .expect(
                "graph",
                "clear",
                json!({"id": "foo", "main": true, "name": "Foo graph"}),
            )
            .send(
                "graph",
                "clear",
                json!({
                    "baseDir": options.resolved_base_dir().display().to_string(),
                    "id": "foo",
                    "main": true,
                    "name": "Foo graph"
                }),
            ),
    )
    .scenario(
        scenario("addnode")
            .expect("graph", "addnode", repeat.clone())
            .expect("graph", "addnode", drop.clone())
            .send("graph", "addnode", repeat)
            .send("graph", "addnode", drop),
    )
}

fn edge() -> Case {
    case("adding_an_edge", "adding an edge should provide the edge back").scenario(echo(
        "addedge",
        "addedge",
        json!({
            "src": {"node": "Repeat1", "port": "out"},
            "tgt": {"node": "Drop1", "port": "in"},
            "metadata": {"route": 5},
            "graph": "foo"
        }),
    ))
}

fn metadata_added() -> Case {
    case(
        "adding_metadata_to_a_node",
        "adding metadata to a node with no metadata should add the metadata",
    )
    .scenario(echo(
        "changenode",
        "changenode",
        json!({"id": "Drop1", "metadata": {"sort": 1}, "graph": "foo"}),
    ))
}

fn metadata_merged() -> Case {
    case(
        "merging_node_metadata",
        "adding metadata to a node with existing metadata should merge the metadata",
    )
    .scenario(
        scenario("changenode")
            .expect(
                "graph",
                "changenode",
                json!({"id": "Drop1", "metadata": {"sort": 1, "tag": "awesome"}, "graph": "foo"}),
            )
            .send(
                "graph",
                "changenode",
                json!({"id": "Drop1", "metadata": {"tag": "awesome"}, "graph": "foo"}),
            ),
    )
}

fn metadata_unchanged() -> Case {
    case(
        "empty_node_metadata",
        "adding metadata with no keys to a node with existing metadata should not change it",
    )
    .scenario(
        scenario("changenode")
            .expect(
                "graph",
                "changenode",
                json!({"id": "Drop1", "metadata": {"sort": 1, "tag": "awesome"}, "graph": "foo"}),
            )
            .send(
                "graph",
                "changenode",
                json!({"id": "Drop1", "metadata": {}, "graph": "foo"}),
            ),
    )
}

fn metadata_removed() -> Case {
    case(
        "removing_node_metadata",
        "adding metadata with a null value should remove it from the node",
    )
    .scenario(
        scenario("changenode")
            .expect(
                "graph",
                "changenode",
                json!({"id": "Drop1", "metadata": {}, "graph": "foo"}),
            )
            .send(
                "graph",
                "changenode",
                json!({"id": "Drop1", "metadata": {"sort": null, "tag": null}, "graph": "foo"}),
            ),
    )
}

fn initial_added() -> Case {
    case("adding_an_iip", "adding an IIP should provide the IIP back").scenario(echo(
        "addinitial",
        "addinitial",
        json!({
            "src": {"data": "Hello, world!"},
            "tgt": {"node": "Repeat1", "port": "in"},
            "metadata": {},
            "graph": "foo"
        }),
    ))
}

fn node_removed() -> Case {
    // Runtimes may interleave changeedge/changenode for journal bookkeeping
    case(
        "removing_a_node",
        "removing a node should remove the node and its associated edges",
    )
    .scenario(
        scenario("removenode")
            .expect(
                "graph",
                "removeedge",
                json!({
                    "src": {"node": "Repeat1", "port": "out"},
                    "tgt": {"node": "Drop1", "port": "in"},
                    "graph": "foo"
                }),
            )
            .expect("graph", "removenode", json!({"id": "Drop1", "graph": "foo"}))
            .send("graph", "removenode", json!({"id": "Drop1", "graph": "foo"})),
    )
}

fn initial_removed() -> Case {
    case(
        "removing_an_iip",
        "removing an IIP should confirm the IIP was removed",
    )
    .scenario(
        scenario("removeinitial")
            .expect(
                "graph",
                "removeinitial",
                json!({
                    "src": {"data": "Hello, world!"},
                    "tgt": {"node": "Repeat1", "port": "in"},
                    "graph": "foo"
                }),
            )
            .send(
                "graph",
                "removeinitial",
                json!({"tgt": {"node": "Repeat1", "port": "in"}, "graph": "foo"}),
            ),
    )
}

fn node_renamed() -> Case {
    case("renaming_a_node", "renaming a node should send the renamenode event").scenario(echo(
        "renamenode",
        "renamenode",
        json!({"from": "Repeat1", "to": "RepeatRenamed", "graph": "foo"}),
    ))
}

fn node_in_missing_graph(options: &TesterOptions) -> Case {
    case(
        "adding_a_node_to_a_missing_graph",
        "adding a node to a non-existent graph should send an error",
    )
    .scenario(
        scenario("addnode_missing_graph")
            .expect(
                "graph",
                "error",
                json!({"message": "Requested graph not found"}),
            )
            .send(
                "graph",
                "addnode",
                json!({
                    "id": "Repeat1",
                    "component": options.component("Repeat"),
                    "graph": "another-graph"
                }),
            ),
    )
}

fn node_without_graph(options: &TesterOptions) -> Case {
    case(
        "adding_a_node_without_a_graph",
        "adding a node without specifying a graph should send an error",
    )
    .scenario(
        scenario("addnode_no_graph")
            .expect("graph", "error", json!({"message": "No graph specified"}))
            .send(
                "graph",
                "addnode",
                json!({"id": "Repeat1", "component": options.component("Repeat")}),
            ),
    )
}

fn inport_added() -> Case {
    case("adding_an_inport", "adding an in-port to a graph should ACK").scenario(
        scenario("addinport")
            .expect(
                "graph",
                "addinport",
                json!({"node": "RepeatRenamed", "graph": "foo", "public": "in", "port": "in"}),
            )
            .send(
                "graph",
                "addinport",
                json!({"public": "in", "node": "RepeatRenamed", "port": "in", "graph": "foo"}),
            ),
    )
}

fn outport_added() -> Case {
    case("adding_an_outport", "adding an out-port to a graph should ACK").scenario(echo(
        "addoutport",
        "addoutport",
        json!({"public": "out", "node": "RepeatRenamed", "port": "out", "graph": "foo"}),
    ))
}

fn outport_removed() -> Case {
    case(
        "removing_an_outport",
        "removing an out-port of a graph should ACK",
    )
    .scenario(echo(
        "removeoutport",
        "removeoutport",
        json!({"public": "out", "graph": "foo"}),
    ))
}

// ============================================================================
// Tests
// ============================================================================
