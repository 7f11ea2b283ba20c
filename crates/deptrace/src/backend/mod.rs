//! Edge discovery backends.
//!
//! The graph builder never talks to a package manager directly. It asks a
//! [`PackageBackend`] four questions and expects deterministic answers for
//! a fixed data snapshot. [`SnapshotBackend`] answers them from a JSONL
//! repository dump.

mod snapshot;

pub use snapshot::{SnapshotBackend, SnapshotPackage};

use crate::domain::{Identity, Kind};
use crate::error::Result;

/// A package as reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    /// Package name.
    pub name: String,
    /// [`Kind::Source`] or [`Kind::Built`].
    pub kind: Kind,
    /// Name of the source package a built package comes from.
    pub source_name: Option<String>,
}

impl PackageRecord {
    /// A source package record.
    pub fn source(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Kind::Source,
            source_name: None,
        }
    }

    /// A built package record.
    pub fn built(name: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Kind::Built,
            source_name: Some(source_name.into()),
        }
    }

    /// Identity of the graph node for this package.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(self.kind, self.name.clone())
    }
}

/// Queries the graph builder needs from a package universe.
///
/// Implementations must be idempotent: the builder memoizes by identity and
/// asks each question at most once per node, but it relies on repeated
/// runs over the same data producing the same graph.
pub trait PackageBackend {
    /// Built packages produced by the source package `source`.
    fn built_from_source(&self, source: &str) -> Result<Vec<PackageRecord>>;

    /// Capability names provided by the built package `built`.
    fn provides_of(&self, built: &str) -> Result<Vec<String>>;

    /// Packages (source or built) that require `capability`.
    fn requirers_of(&self, capability: &str) -> Result<Vec<PackageRecord>>;

    /// All packages of `kind` named `name`.
    ///
    /// Callers that need exactly one record treat any other count as a
    /// backend inconsistency.
    fn packages_named(&self, name: &str, kind: Kind) -> Result<Vec<PackageRecord>>;
}
