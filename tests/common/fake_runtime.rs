//! A minimal FBP runtime that keeps just enough graph and network state to
//! answer the conformance catalog.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use super::{Reply, msg, route};

const CAPABILITIES: [&str; 3] = ["protocol:graph", "protocol:network", "protocol:component"];

#[derive(Debug, Clone, PartialEq)]
struct Edge {
    graph: String,
    src: Value,
    tgt: Value,
}

/// Graph and network state for the fake runtime.
#[derive(Debug)]
pub struct FakeRuntime {
    collection: String,
    capabilities: Vec<String>,
    graphs: Vec<String>,
    node_metadata: BTreeMap<String, Map<String, Value>>,
    edges: Vec<Edge>,
    initials: Vec<(Value, Value)>,
    started: bool,
}

impl FakeRuntime {
    /// A runtime granting every capability.
    pub fn new(collection: &str) -> Self {
        Self::with_capabilities(collection, &CAPABILITIES)
    }

    /// A runtime granting only `capabilities`.
    pub fn with_capabilities(collection: &str, capabilities: &[&str]) -> Self {
        Self {
            collection: collection.to_owned(),
            capabilities: capabilities.iter().map(|c| (*c).to_owned()).collect(),
            graphs: Vec::new(),
            node_metadata: BTreeMap::new(),
            edges: Vec::new(),
            initials: Vec::new(),
            started: false,
        }
    }

    /// Answers one command.
    pub fn respond(&mut self, command: &Value) -> Vec<Reply> {
        let mut payload = command["payload"].as_object().cloned().unwrap_or_default();
        payload.remove("secret");

        match route(command) {
            ("runtime", "getruntime") => vec![msg(
                "runtime",
                "runtime",
                json!({
                    "type": "fake",
                    "version": "0.7",
                    "capabilities": self.capabilities,
                    "allCapabilities": CAPABILITIES,
                    "graph": "foo"
                }),
            )],

            ("graph", "clear") => {
                payload.remove("baseDir");
                if let Some(id) = payload.get("id").and_then(Value::as_str) {
                    self.graphs.push(id.to_owned());
                }
                vec![msg("graph", "clear", Value::Object(payload))]
            }

            ("graph", "addnode") => {
                let graph = payload.get("graph").and_then(Value::as_str);
                match graph {
                    None => vec![graph_error("No graph specified")],
                    Some(graph) if !self.graphs.iter().any(|g| g == graph) => {
                        vec![graph_error("Requested graph not found")]
                    }
                    Some(_) => {
                        let id = payload["id"].as_str().unwrap_or_default().to_owned();
                        let metadata = payload
                            .get("metadata")
                            .and_then(Value::as_object)
                            .cloned()
                            .unwrap_or_default();
                        self.node_metadata.insert(id, metadata);
                        vec![msg("graph", "addnode", Value::Object(payload))]
                    }
                }
            }

            ("graph", "addedge") => {
                self.edges.push(Edge {
                    graph: payload["graph"].as_str().unwrap_or_default().to_owned(),
                    src: payload["src"].clone(),
                    tgt: payload["tgt"].clone(),
                });
                vec![msg("graph", "addedge", Value::Object(payload))]
            }

            ("graph", "changenode") => {
                let id = payload["id"].as_str().unwrap_or_default().to_owned();
                let stored = self.node_metadata.entry(id.clone()).or_default();
                if let Some(changes) = payload.get("metadata").and_then(Value::as_object) {
                    for (key, value) in changes {
                        if value.is_null() {
                            stored.remove(key);
                        } else {
                            stored.insert(key.clone(), value.clone());
                        }
                    }
                }
                vec![msg(
                    "graph",
                    "changenode",
                    json!({"id": id, "metadata": stored.clone(), "graph": payload["graph"]}),
                )]
            }

            ("graph", "addinitial") => {
                self.initials
                    .push((payload["src"].clone(), payload["tgt"].clone()));
                vec![msg("graph", "addinitial", Value::Object(payload))]
            }

            ("graph", "removenode") => {
                let id = payload["id"].as_str().unwrap_or_default().to_owned();
                let graph = payload["graph"].clone();
                let (removed, kept): (Vec<_>, Vec<_>) = self
                    .edges
                    .drain(..)
                    .partition(|e| e.src["node"] == id.as_str() || e.tgt["node"] == id.as_str());
                self.edges = kept;
                self.node_metadata.remove(&id);

                // Journal noise before the interesting messages
                let mut replies = vec![msg(
                    "graph",
                    "changenode",
                    json!({"id": id, "metadata": {}, "graph": graph}),
                )];
                replies.extend(removed.into_iter().map(|edge| {
                    msg(
                        "graph",
                        "removeedge",
                        json!({"src": edge.src, "tgt": edge.tgt, "graph": edge.graph}),
                    )
                }));
                replies.push(msg("graph", "removenode", json!({"id": id, "graph": graph})));
                replies
            }

            ("graph", "removeinitial") => {
                let tgt = payload["tgt"].clone();
                let position = self.initials.iter().position(|(_, t)| *t == tgt);
                match position.map(|i| self.initials.remove(i)) {
                    Some((src, tgt)) => vec![msg(
                        "graph",
                        "removeinitial",
                        json!({"src": src, "tgt": tgt, "graph": payload["graph"]}),
                    )],
                    None => vec![graph_error("Requested IIP not found")],
                }
            }

            ("graph", name @ ("renamenode" | "addinport" | "addoutport" | "removeoutport")) => {
                vec![msg("graph", name, Value::Object(payload))]
            }

            ("network", "start") => {
                self.started = true;
                let graph = payload["graph"].clone();
                vec![
                    msg(
                        "network",
                        "started",
                        json!({
                            "graph": graph,
                            "started": true,
                            "running": true,
                            "time": "2024-01-01T00:00:00.000Z"
                        }),
                    ),
                    msg(
                        "network",
                        "data",
                        json!({
                            "id": "DATA -> IN Hello()",
                            "graph": graph,
                            "tgt": {"node": "Hello", "port": "in"},
                            "data": "Hello, world!"
                        }),
                    ),
                    msg(
                        "network",
                        "data",
                        json!({
                            "id": "Hello() OUT -> IN World()",
                            "graph": graph,
                            "src": {"node": "Hello", "port": "out"},
                            "tgt": {"node": "World", "port": "in"},
                            "data": "Hello, world!"
                        }),
                    ),
                ]
            }

            ("network", "getstatus") => vec![msg(
                "network",
                "status",
                json!({"graph": payload["graph"], "running": false, "started": self.started}),
            )],

            ("network", "stop") => {
                self.started = false;
                vec![msg(
                    "network",
                    "stopped",
                    json!({
                        "graph": payload["graph"],
                        "running": false,
                        "started": false,
                        "time": "2024-01-01T00:00:01.000Z",
                        "uptime": 1000
                    }),
                )]
            }

            ("component", "list") => {
                let mut replies: Vec<_> = ["Drop", "Repeat"]
                    .into_iter()
                    .map(|name| {
                        msg(
                            "component",
                            "component",
                            json!({
                                "name": format!("{}/{name}", self.collection),
                                "description": "",
                                "subgraph": false,
                                "inPorts": [],
                                "outPorts": []
                            }),
                        )
                    })
                    .collect();
                replies.push(msg("component", "componentsready", json!({})));
                replies
            }

            (protocol, _) => vec![msg(
                protocol,
                "error",
                json!({"message": "Unknown command"}),
            )],
        }
    }
}

fn graph_error(message: &str) -> Reply {
    msg(
        "graph",
        "error",
        json!({"message": message, "stack": "Error: fake runtime\n    at respond"}),
    )
}
