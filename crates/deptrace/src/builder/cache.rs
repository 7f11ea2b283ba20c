//! Identity-keyed node store used during graph construction.
//!
//! Nodes live in a `petgraph` directed graph with one edge per
//! (discoverer, discovered) pair. A node's parents are its incoming
//! neighbors, ordered by when the edge was added.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::domain::{Identity, Kind};

/// Index of a node in a [`NodeCache`]. Indices follow discovery order.
pub type NodeId = NodeIndex;

/// A discovered graph node.
#[derive(Debug, Clone)]
pub struct Node {
    /// Kind and name.
    pub identity: Identity,
    /// Length of the first discovery chain. Never revised.
    pub depth: usize,
    /// Chain of discoverers at first discovery, nearest first.
    pub lineage: Vec<NodeId>,
    /// Source package of a built node.
    pub source_name: Option<String>,
    /// For capabilities: skip source-package requirers on expansion.
    pub ignore_build_requirers: bool,
    pub(super) expanded: bool,
}

impl Node {
    /// Whether this node's edges have been queried.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }
}

/// What a discoverer knows about a node it found.
#[derive(Debug, Clone)]
pub(super) struct Discovery {
    pub identity: Identity,
    pub source_name: Option<String>,
    pub ignore_build_requirers: bool,
}

impl Discovery {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            source_name: None,
            ignore_build_requirers: false,
        }
    }
}

/// Memoizing store of nodes: at most one [`Node`] per identity.
#[derive(Debug, Default)]
pub struct NodeCache {
    /// Edges point from discoverer to discovered.
    graph: DiGraph<Node, ()>,
    node_map: HashMap<Identity, NodeIndex>,
}

impl NodeCache {
    /// Return the node for `discovery.identity`, creating it on first sight.
    ///
    /// Depth and lineage come from the first discoverer only; every later
    /// discoverer only gains an edge to the node. The returned flag is
    /// `true` when the node was created by this call.
    pub(super) fn discover(&mut self, discovery: Discovery, parent: Option<NodeId>) -> (NodeId, bool) {
        if let Some(&id) = self.node_map.get(&discovery.identity) {
            if let Some(parent) = parent
                && self.graph.find_edge(parent, id).is_none()
            {
                self.graph.add_edge(parent, id, ());
            }
            return (id, false);
        }

        let (depth, lineage) = match parent {
            Some(parent) => {
                let discoverer = &self.graph[parent];
                let mut lineage = Vec::with_capacity(discoverer.lineage.len() + 1);
                lineage.push(parent);
                lineage.extend_from_slice(&discoverer.lineage);
                (discoverer.depth + 1, lineage)
            }
            None => (0, Vec::new()),
        };

        let id = self.graph.add_node(Node {
            identity: discovery.identity.clone(),
            depth,
            lineage,
            source_name: discovery.source_name,
            ignore_build_requirers: discovery.ignore_build_requirers,
            expanded: false,
        });
        self.node_map.insert(discovery.identity, id);
        if let Some(parent) = parent {
            self.graph.add_edge(parent, id, ());
        }
        (id, true)
    }

    pub(super) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.graph[id]
    }

    /// The node at `id`.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.graph[id]
    }

    /// Id of the node with `identity`, if discovered.
    #[must_use]
    pub fn id_of(&self, identity: &Identity) -> Option<NodeId> {
        self.node_map.get(identity).copied()
    }

    /// Look a node up by identity.
    #[must_use]
    pub fn get(&self, identity: &Identity) -> Option<&Node> {
        self.id_of(identity).map(|id| &self.graph[id])
    }

    /// Every discoverer of `id`, in discovery order, without duplicates.
    #[must_use]
    pub fn parents(&self, id: NodeId) -> Vec<NodeId> {
        let mut edges: Vec<_> = self.graph.edges_directed(id, Direction::Incoming).collect();
        edges.sort_by_key(|edge| edge.id());
        edges.into_iter().map(|edge| edge.source()).collect()
    }

    /// All nodes in discovery order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.graph.node_indices().map(|id| (id, &self.graph[id]))
    }

    /// Ids of all nodes of `kind`, in discovery order.
    #[must_use]
    pub fn ids_of_kind(&self, kind: Kind) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, node)| node.identity.kind() == kind)
            .map(|(id, _)| id)
            .collect()
    }

    /// Number of nodes of `kind`.
    #[must_use]
    pub fn count(&self, kind: Kind) -> usize {
        self.graph
            .node_weights()
            .filter(|node| node.identity.kind() == kind)
            .count()
    }

    /// Number of distinct (discoverer, discovered) pairs.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Total number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether no node has been discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}
