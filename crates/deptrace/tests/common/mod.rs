//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use deptrace::Kind;
use deptrace::backend::{PackageBackend, PackageRecord, SnapshotBackend, SnapshotPackage};
use deptrace::config::BuilderRules;

/// A source package line.
pub fn src(name: &str, build_requires: &[&str]) -> SnapshotPackage {
    SnapshotPackage {
        name: name.to_string(),
        arch: "src".to_string(),
        source_name: None,
        provides: Vec::new(),
        requires: build_requires.iter().map(ToString::to_string).collect(),
    }
}

/// A built package line.
pub fn blt(name: &str, source: &str, provides: &[&str], requires: &[&str]) -> SnapshotPackage {
    SnapshotPackage {
        name: name.to_string(),
        arch: "x86_64".to_string(),
        source_name: Some(source.to_string()),
        provides: provides.iter().map(ToString::to_string).collect(),
        requires: requires.iter().map(ToString::to_string).collect(),
    }
}

/// A small legacy universe rooted at `SRC:python27`:
///
/// ```text
/// python27 -> python(abi) = 2.7 -> python2-lib -> python2-lib = 1.0 -> app
///                          \-> tool (build requirement) -> python2-tool
/// ```
pub fn python_universe() -> Vec<SnapshotPackage> {
    vec![
        src("python27", &[]),
        blt("python27", "python27", &["python(abi) = 2.7"], &[]),
        src("python-lib", &[]),
        blt("python2-lib", "python-lib", &["python2-lib = 1.0"], &["python(abi) = 2.7"]),
        blt("python3-lib", "python-lib", &["python3-lib = 1.0"], &[]),
        src("app", &[]),
        blt("app", "app", &[], &["python2-lib"]),
        src("tool", &["python(abi) = 2.7"]),
        blt("python2-tool", "tool", &[], &[]),
    ]
}

/// Backend over `packages`.
pub fn snapshot(packages: Vec<SnapshotPackage>) -> SnapshotBackend {
    SnapshotBackend::from_packages(packages).unwrap()
}

/// Rules with no exclusions, rooted at `roots`.
pub fn bare_rules(roots: &[&str]) -> BuilderRules {
    BuilderRules {
        roots: roots.iter().map(|r| r.parse().unwrap()).collect(),
        excluded_sources: BTreeSet::new(),
        excluded_built_by_source: BTreeSet::new(),
        excluded_built: BTreeSet::new(),
        terminal_prefixes: Vec::new(),
        build_only_sources: BTreeSet::new(),
        noise_capabilities: BTreeSet::new(),
        ..BuilderRules::default()
    }
}

/// Backend wrapper that counts every query by `kind:argument`.
pub struct CountingBackend<B> {
    inner: B,
    calls: RefCell<HashMap<String, usize>>,
}

impl<B: PackageBackend> CountingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            calls: RefCell::new(HashMap::new()),
        }
    }

    fn record(&self, query: &str, argument: &str) {
        *self
            .calls
            .borrow_mut()
            .entry(format!("{query}:{argument}"))
            .or_default() += 1;
    }

    /// All query keys with their counts.
    pub fn calls(&self) -> HashMap<String, usize> {
        self.calls.borrow().clone()
    }
}

impl<B: PackageBackend> PackageBackend for CountingBackend<B> {
    fn built_from_source(&self, source: &str) -> deptrace::Result<Vec<PackageRecord>> {
        self.record("built_from_source", source);
        self.inner.built_from_source(source)
    }

    fn provides_of(&self, built: &str) -> deptrace::Result<Vec<String>> {
        self.record("provides_of", built);
        self.inner.provides_of(built)
    }

    fn requirers_of(&self, capability: &str) -> deptrace::Result<Vec<PackageRecord>> {
        self.record("requirers_of", capability);
        self.inner.requirers_of(capability)
    }

    fn packages_named(&self, name: &str, kind: Kind) -> deptrace::Result<Vec<PackageRecord>> {
        self.record("packages_named", &format!("{kind}:{name}"));
        self.inner.packages_named(name, kind)
    }
}
