//! In-memory backend over a JSONL repository snapshot.
//!
//! Each snapshot line describes one package:
//!
//! ```json
//! {"name": "python2-six", "arch": "noarch", "source_name": "python-six",
//!  "provides": ["python2-six = 1.12.0"], "requires": ["python(abi) = 2.7"]}
//! ```
//!
//! `arch == "src"` marks a source package, whose `requires` are its build
//! requirements. A requirement matches a capability when it equals the
//! capability name or its unversioned label.

use std::collections::HashMap;
use std::path::Path;

use deptrace_jsonl::read_jsonl;
use serde::{Deserialize, Serialize};

use super::{PackageBackend, PackageRecord};
use crate::domain::{Kind, label};
use crate::error::{Error, Result};

/// Architecture tag of source packages.
pub const SOURCE_ARCH: &str = "src";

/// One package line of a repository snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotPackage {
    /// Package name.
    pub name: String,
    /// Architecture; `src` for source packages.
    pub arch: String,
    /// Originating source package (required for built packages).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    /// Capabilities provided.
    #[serde(default)]
    pub provides: Vec<String>,
    /// Capabilities required (build requirements for source packages).
    #[serde(default)]
    pub requires: Vec<String>,
}

impl SnapshotPackage {
    /// Whether this is a source package.
    #[must_use]
    pub fn is_source(&self) -> bool {
        self.arch == SOURCE_ARCH
    }

    fn record(&self) -> PackageRecord {
        match (&self.source_name, self.is_source()) {
            (Some(source), false) => PackageRecord::built(self.name.clone(), source.clone()),
            _ => PackageRecord::source(self.name.clone()),
        }
    }
}

/// [`PackageBackend`] answering from an in-memory snapshot.
#[derive(Debug, Default)]
pub struct SnapshotBackend {
    packages: Vec<SnapshotPackage>,
    sources_by_name: HashMap<String, Vec<usize>>,
    built_by_name: HashMap<String, Vec<usize>>,
    built_by_source: HashMap<String, Vec<usize>>,
    requirers: HashMap<String, Vec<usize>>,
}

impl SnapshotBackend {
    /// Index a list of snapshot packages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSnapshot`] if a built package has no
    /// `source_name`.
    pub fn from_packages(packages: Vec<SnapshotPackage>) -> Result<Self> {
        let mut backend = Self::default();
        for (idx, package) in packages.iter().enumerate() {
            if package.is_source() {
                backend
                    .sources_by_name
                    .entry(package.name.clone())
                    .or_default()
                    .push(idx);
            } else {
                let source = package.source_name.as_ref().ok_or_else(|| {
                    Error::InvalidSnapshot(format!(
                        "built package '{}' has no source_name",
                        package.name
                    ))
                })?;
                backend
                    .built_by_name
                    .entry(package.name.clone())
                    .or_default()
                    .push(idx);
                backend
                    .built_by_source
                    .entry(source.clone())
                    .or_default()
                    .push(idx);
            }
            for requirement in &package.requires {
                let entry = backend.requirers.entry(requirement.clone()).or_default();
                if entry.last() != Some(&idx) {
                    entry.push(idx);
                }
            }
        }
        backend.packages = packages;
        tracing::debug!(
            packages = backend.packages.len(),
            sources = backend.sources_by_name.len(),
            built = backend.built_by_name.len(),
            "indexed repository snapshot"
        );
        Ok(backend)
    }

    /// Load a snapshot file. Every line must decode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSnapshot`] naming the line if a package does
    /// not decode, an I/O error if the file cannot be read, or any error of
    /// [`from_packages`](Self::from_packages).
    pub async fn load(path: &Path) -> Result<Self> {
        let packages = read_jsonl::<SnapshotPackage, _>(path).await.map_err(|e| match e {
            deptrace_jsonl::Error::Parse { .. } => {
                Error::InvalidSnapshot(format!("{}: {e}", path.display()))
            }
            other => Error::Jsonl(other),
        })?;
        Self::from_packages(packages)
    }

    /// Number of packages in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn records(&self, indices: &[usize]) -> Vec<PackageRecord> {
        indices.iter().map(|&idx| self.packages[idx].record()).collect()
    }
}

impl PackageBackend for SnapshotBackend {
    fn built_from_source(&self, source: &str) -> Result<Vec<PackageRecord>> {
        Ok(self
            .built_by_source
            .get(source)
            .map(|indices| self.records(indices))
            .unwrap_or_default())
    }

    fn provides_of(&self, built: &str) -> Result<Vec<String>> {
        let mut provides: Vec<String> = Vec::new();
        for &idx in self.built_by_name.get(built).into_iter().flatten() {
            for provide in &self.packages[idx].provides {
                if !provides.contains(provide) {
                    provides.push(provide.clone());
                }
            }
        }
        Ok(provides)
    }

    fn requirers_of(&self, capability: &str) -> Result<Vec<PackageRecord>> {
        let mut indices: Vec<usize> = self
            .requirers
            .get(capability)
            .cloned()
            .unwrap_or_default();
        let unversioned = label(capability);
        if unversioned != capability {
            indices.extend(self.requirers.get(unversioned).into_iter().flatten());
        }
        indices.sort_unstable();
        indices.dedup();
        Ok(self.records(&indices))
    }

    fn packages_named(&self, name: &str, kind: Kind) -> Result<Vec<PackageRecord>> {
        let index = match kind {
            Kind::Source => &self.sources_by_name,
            Kind::Built => &self.built_by_name,
            Kind::Capability => return Ok(Vec::new()),
        };
        Ok(index
            .get(name)
            .map(|indices| self.records(indices))
            .unwrap_or_default())
    }
}
