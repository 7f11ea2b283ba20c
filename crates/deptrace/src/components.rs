//! Source-to-source component edges derived from a node index.
//!
//! A source `S` depends on component `C` when walking up from one of `S`'s
//! parents reaches `C` before any other source. The edges render as a
//! Graphviz digraph.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;

use petgraph::graph::{DiGraph, NodeIndex as GraphIndex};
use petgraph::visit::{Control, DfsEvent, Reversed, depth_first_search};

use crate::domain::{Identity, Kind};
use crate::error::{Error, Result};
use crate::index::{NodeIndex, NodeRecord};

/// Component edges: source name to the source names it depends on.
pub type ComponentEdges = BTreeMap<String, BTreeSet<String>>;

/// Collect the component edges of every source in `index`.
///
/// Self edges and edges into `pinned` identities are dropped.
///
/// # Errors
///
/// Returns [`crate::Error::UnknownIdentity`] if a record names a parent
/// missing from the index.
pub fn component_edges(index: &NodeIndex, pinned: &[Identity]) -> Result<ComponentEdges> {
    let graph = ParentGraph::new(index)?;
    let pinned: HashSet<&Identity> = pinned.iter().collect();
    let mut edges = ComponentEdges::new();

    for source in index.sorted_of_kind(Kind::Source) {
        let mut targets = BTreeSet::new();
        for parent in &source.parents {
            for component in graph.nearest_sources(parent) {
                if component != &source.identity && !pinned.contains(component) {
                    targets.insert(component.name().to_string());
                }
            }
        }
        if !targets.is_empty() {
            edges.insert(source.name.clone(), targets);
        }
    }

    tracing::debug!(sources = edges.len(), "collected component edges");
    Ok(edges)
}

/// The index as a graph with one edge from each parent to its child.
struct ParentGraph<'a> {
    graph: DiGraph<&'a NodeRecord, ()>,
    node_map: HashMap<&'a Identity, GraphIndex>,
}

impl<'a> ParentGraph<'a> {
    fn new(index: &'a NodeIndex) -> Result<Self> {
        let mut graph = DiGraph::with_capacity(index.len(), index.len());
        let mut node_map = HashMap::with_capacity(index.len());
        let nodes: Vec<(GraphIndex, &NodeRecord)> = index
            .records()
            .map(|record| {
                let node = graph.add_node(record);
                node_map.insert(&record.identity, node);
                (node, record)
            })
            .collect();

        for (child, record) in nodes {
            for parent in &record.parents {
                let parent = node_map
                    .get(parent)
                    .copied()
                    .ok_or_else(|| Error::UnknownIdentity(parent.clone()))?;
                graph.update_edge(parent, child, ());
            }
        }
        Ok(Self { graph, node_map })
    }

    /// Sources reached first on every upward path from `start`.
    fn nearest_sources(&self, start: &Identity) -> Vec<&'a Identity> {
        let Some(&start) = self.node_map.get(start) else {
            return Vec::new();
        };
        let mut found = Vec::new();
        depth_first_search(Reversed(&self.graph), Some(start), |event| {
            if let DfsEvent::Discover(node, _) = event {
                let record: &'a NodeRecord = self.graph[node];
                if record.kind == Kind::Source {
                    found.push(&record.identity);
                    return Control::<()>::Prune;
                }
            }
            Control::Continue
        });
        found
    }
}

/// Quote a node name for Graphviz.
fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\\\""))
}

/// Render edges as a Graphviz digraph.
#[must_use]
pub fn render_dot(edges: &ComponentEdges) -> String {
    let mut out = String::from("digraph G {\n");
    for (source, targets) in edges {
        for target in targets {
            let _ = writeln!(out, "{} -> {};", quote(source), quote(target));
        }
    }
    out.push_str("}\n");
    out
}
