//! Breadth-first construction of the legacy dependency graph.
//!
//! Starting from the legacy roots, the builder repeatedly asks the backend
//! "who is reachable from this node" with kind-specific rules:
//!
//! - a source package reaches the built packages it produces,
//! - a built package reaches the capabilities it provides,
//! - a capability reaches every package that requires it,
//! - a built package also reaches the source package it was built from.
//!
//! Edges are recorded in discovery direction: a node's parents are the
//! nodes whose expansion found it. Rendering later walks parents back
//! towards the roots to explain why a package is affected.
//!
//! # Passes
//!
//! 1. Primary: FIFO queue seeded with the roots. Every node is expanded at
//!    most once; nodes found for the first time are queued.
//! 2. Shallow: capability nodes still unexpanded (left behind by a depth
//!    limit) are expanded once, without queueing what they find.
//! 3. Sources: every built package is linked to its source package.

mod cache;

pub use cache::{Node, NodeCache, NodeId};

use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::backend::{PackageBackend, PackageRecord};
use crate::config::{BuilderRules, FamilyMarkers};
use crate::domain::{Identity, Kind};
use crate::error::{Error, Result};
use crate::index::NodeRecord;
use cache::Discovery;

/// Counters reported after each pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Nodes expanded by the primary pass.
    pub expanded: usize,
    /// Nodes the primary pass left unexpanded because of the depth limit.
    pub deferred: usize,
    /// Capabilities expanded by the shallow pass.
    pub shallow_expanded: usize,
    /// Built packages linked to their source by the last pass.
    pub sources_resolved: usize,
}

/// Memoized breadth-first graph builder.
pub struct GraphBuilder<'a, B: PackageBackend + ?Sized> {
    backend: &'a B,
    rules: &'a BuilderRules,
    cache: NodeCache,
    queue: VecDeque<NodeId>,
    stats: BuildStats,
}

impl<'a, B: PackageBackend + ?Sized> GraphBuilder<'a, B> {
    /// Create a builder with no roots.
    pub fn new(backend: &'a B, rules: &'a BuilderRules) -> Self {
        Self {
            backend,
            rules,
            cache: NodeCache::default(),
            queue: VecDeque::new(),
            stats: BuildStats::default(),
        }
    }

    /// Create a builder seeded with `rules.roots`.
    ///
    /// # Errors
    ///
    /// See [`add_root`](Self::add_root).
    pub fn with_configured_roots(backend: &'a B, rules: &'a BuilderRules) -> Result<Self> {
        let mut builder = Self::new(backend, rules);
        for root in &rules.roots {
            builder.add_root(root)?;
        }
        Ok(builder)
    }

    /// Seed the walk with a root at depth 0.
    ///
    /// Source and built roots must exist exactly once in the backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendInconsistency`] if a package root matches
    /// zero or several packages.
    pub fn add_root(&mut self, identity: &Identity) -> Result<NodeId> {
        let discovery = match identity.kind() {
            Kind::Capability => Discovery::new(identity.clone()),
            kind => {
                let record = self.exactly_one(identity.name(), kind, || {
                    format!("root package '{identity}'")
                })?;
                Discovery {
                    identity: record.identity(),
                    source_name: record.source_name,
                    ignore_build_requirers: false,
                }
            }
        };
        let (id, _) = self.cache.discover(discovery, None);
        tracing::debug!(root = %identity, "added root");
        self.queue.push_back(id);
        Ok(id)
    }

    /// Run all passes and return the finished graph.
    ///
    /// # Errors
    ///
    /// Backend errors and [`Error::BackendInconsistency`] abort the build;
    /// no partial graph is returned.
    pub fn build(mut self) -> Result<DependencyGraph> {
        while let Some(id) = self.queue.pop_front() {
            let node = self.cache.node(id);
            if node.expanded {
                continue;
            }
            if self.rules.max_depth.is_some_and(|max| node.depth >= max) {
                self.stats.deferred += 1;
                continue;
            }
            self.expand(id, true)?;
            self.stats.expanded += 1;
        }
        self.log_progress("primary");

        for id in self.cache.ids_of_kind(Kind::Capability) {
            if !self.cache.node(id).expanded {
                self.expand(id, false)?;
                self.stats.shallow_expanded += 1;
            }
        }
        self.log_progress("shallow");

        for id in self.cache.ids_of_kind(Kind::Built) {
            self.resolve_source(id)?;
            self.stats.sources_resolved += 1;
        }
        self.log_progress("sources");

        Ok(DependencyGraph {
            cache: self.cache,
            stats: self.stats,
        })
    }

    fn log_progress(&self, pass: &str) {
        tracing::info!(
            pass,
            expanded = self.stats.expanded,
            queued = self.queue.len(),
            sources = self.cache.count(Kind::Source),
            built = self.cache.count(Kind::Built),
            capabilities = self.cache.count(Kind::Capability),
            edges = self.cache.edge_count(),
            "graph pass finished"
        );
    }

    fn expand(&mut self, id: NodeId, enqueue: bool) -> Result<()> {
        self.cache.node_mut(id).expanded = true;
        let node = self.cache.node(id);
        if tracing::enabled!(tracing::Level::TRACE) {
            let lineage: Vec<String> = node
                .lineage
                .iter()
                .map(|&ancestor| self.cache.node(ancestor).identity.to_string())
                .collect();
            tracing::trace!(node = %node.identity, depth = node.depth, lineage = ?lineage, "expanding");
        }

        let discoveries = match node.identity.kind() {
            Kind::Source => self.source_outputs(node)?,
            Kind::Built => self.provided_capabilities(node)?,
            Kind::Capability => self.capability_requirers(node)?,
        };

        for discovery in discoveries {
            let (child, created) = self.cache.discover(discovery, Some(id));
            if created && enqueue {
                self.queue.push_back(child);
            }
        }
        Ok(())
    }

    fn source_outputs(&self, node: &Node) -> Result<Vec<Discovery>> {
        let name = node.identity.name();
        if self.rules.excluded_sources.contains(name) {
            tracing::trace!(source = name, "excluded source, not traversing outputs");
            return Ok(Vec::new());
        }
        let records = self.backend.built_from_source(name)?;
        let names: HashSet<&str> = records.iter().map(|r| r.name.as_str()).collect();
        Ok(records
            .iter()
            .filter(|r| include_subpackage(&r.name, &names, &self.rules.family))
            .map(|r| Discovery {
                identity: Identity::built(r.name.clone()),
                source_name: Some(r.source_name.clone().unwrap_or_else(|| name.to_string())),
                ignore_build_requirers: false,
            })
            .collect())
    }

    fn provided_capabilities(&self, node: &Node) -> Result<Vec<Discovery>> {
        let name = node.identity.name();
        let source = node.source_name.as_deref();
        let excluded = source.is_some_and(|s| self.rules.excluded_built_by_source.contains(s))
            || self.rules.excluded_built.contains(name)
            || self
                .rules
                .terminal_prefixes
                .iter()
                .any(|prefix| name.starts_with(prefix.as_str()));
        if excluded {
            tracing::trace!(built = name, "excluded built package, not traversing provides");
            return Ok(Vec::new());
        }
        let ignore_build_requirers =
            source.is_some_and(|s| self.rules.build_only_sources.contains(s));
        Ok(self
            .backend
            .provides_of(name)?
            .into_iter()
            .map(|provide| Discovery {
                identity: Identity::capability(provide),
                source_name: None,
                ignore_build_requirers,
            })
            .collect())
    }

    fn capability_requirers(&self, node: &Node) -> Result<Vec<Discovery>> {
        let name = node.identity.name();
        if self.rules.noise_capabilities.contains(name) {
            tracing::trace!(capability = name, "noise capability, not traversing requirers");
            return Ok(Vec::new());
        }
        Ok(self
            .backend
            .requirers_of(name)?
            .into_iter()
            .filter(|r| r.kind != Kind::Capability)
            .filter(|r| !(node.ignore_build_requirers && r.kind == Kind::Source))
            .map(|r| Discovery {
                identity: r.identity(),
                source_name: r.source_name,
                ignore_build_requirers: false,
            })
            .collect())
    }

    fn resolve_source(&mut self, id: NodeId) -> Result<()> {
        let node = self.cache.node(id);
        let built = node.identity.name().to_string();
        let source = node.source_name.clone().ok_or_else(|| Error::BackendInconsistency {
            query: format!("source name for built package '{built}'"),
            found: 0,
        })?;
        let record = self.exactly_one(&source, Kind::Source, || {
            format!("source package '{source}' of built package '{built}'")
        })?;
        self.cache
            .discover(Discovery::new(Identity::source(record.name)), Some(id));
        Ok(())
    }

    fn exactly_one(
        &self,
        name: &str,
        kind: Kind,
        describe: impl FnOnce() -> String,
    ) -> Result<PackageRecord> {
        let mut records = self.backend.packages_named(name, kind)?;
        if records.len() == 1 {
            Ok(records.remove(0))
        } else {
            Err(Error::BackendInconsistency {
                query: describe(),
                found: records.len(),
            })
        }
    }
}

/// Whether a built package survives subpackage suppression.
///
/// `python3-foo` is dropped when `python2-foo` is built by the same source,
/// so one source does not show up twice for parallel families.
#[must_use]
pub fn include_subpackage(name: &str, siblings: &HashSet<&str>, family: &FamilyMarkers) -> bool {
    if !name.contains(family.current.as_str()) {
        return true;
    }
    let legacy_sibling = name.replace(family.current.as_str(), family.legacy.as_str());
    !siblings.contains(legacy_sibling.as_str())
}

/// A finished, read-only dependency graph.
#[derive(Debug)]
pub struct DependencyGraph {
    cache: NodeCache,
    stats: BuildStats,
}

impl DependencyGraph {
    /// The underlying node store.
    #[must_use]
    pub fn cache(&self) -> &NodeCache {
        &self.cache
    }

    /// Counters collected while building.
    #[must_use]
    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Look a node up by identity.
    #[must_use]
    pub fn get(&self, identity: &Identity) -> Option<&Node> {
        self.cache.get(identity)
    }

    /// Identities of a node's parents, in discovery order.
    #[must_use]
    pub fn parents_of(&self, identity: &Identity) -> Vec<&Identity> {
        self.cache
            .id_of(identity)
            .map(|id| {
                self.cache
                    .parents(id)
                    .into_iter()
                    .map(|p| &self.cache.node(p).identity)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The chain of first discoverers of a node, nearest first.
    #[must_use]
    pub fn lineage_of(&self, identity: &Identity) -> Vec<&Identity> {
        self.get(identity)
            .map(|node| {
                node.lineage
                    .iter()
                    .map(|&p| &self.cache.node(p).identity)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Node index records: built packages, then sources, then
    /// capabilities, each in discovery order.
    #[must_use]
    pub fn records(&self) -> Vec<NodeRecord> {
        [Kind::Built, Kind::Source, Kind::Capability]
            .into_iter()
            .flat_map(|kind| self.cache.ids_of_kind(kind))
            .map(|id| {
                let node = self.cache.node(id);
                NodeRecord {
                    identity: node.identity.clone(),
                    name: node.identity.name().to_string(),
                    kind: node.identity.kind(),
                    depth: node.depth,
                    parents: self
                        .cache
                        .parents(id)
                        .into_iter()
                        .map(|p| self.cache.node(p).identity.clone())
                        .collect(),
                }
            })
            .collect()
    }
}
