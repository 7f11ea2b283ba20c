//! Integration tests for graph construction over snapshot backends.

use std::collections::HashSet;

use deptrace::builder::{DependencyGraph, GraphBuilder};
use deptrace::config::BuilderRules;
use deptrace::{Error, Identity, Kind};
use proptest::prelude::*;
use rstest::{fixture, rstest};

mod common;
use common::{CountingBackend, bare_rules, blt, python_universe, snapshot, src};

fn build(packages: Vec<deptrace::backend::SnapshotPackage>, rules: &BuilderRules) -> DependencyGraph {
    let backend = snapshot(packages);
    GraphBuilder::with_configured_roots(&backend, rules)
        .unwrap()
        .build()
        .unwrap()
}

fn depth(graph: &DependencyGraph, identity: &str) -> Option<usize> {
    graph.get(&identity.parse().unwrap()).map(|node| node.depth)
}

#[fixture]
fn python_rules() -> BuilderRules {
    bare_rules(&["SRC:python27"])
}

// ============================================================================
// Depth and parents
// ============================================================================

#[rstest]
#[case("SRC:python27", 0)]
#[case("BLT:python27", 1)]
#[case("DEP:python(abi) = 2.7", 2)]
#[case("BLT:python2-lib", 3)]
#[case("SRC:tool", 3)]
#[case("DEP:python2-lib = 1.0", 4)]
#[case("BLT:python2-tool", 4)]
#[case("SRC:python-lib", 4)]
#[case("BLT:app", 5)]
#[case("SRC:app", 6)]
fn depth_is_first_discovery_distance(
    python_rules: BuilderRules,
    #[case] identity: &str,
    #[case] expected: usize,
) {
    let graph = build(python_universe(), &python_rules);
    assert_eq!(depth(&graph, identity), Some(expected));
}

#[rstest]
fn later_discoverers_are_appended_to_parents(python_rules: BuilderRules) {
    let graph = build(python_universe(), &python_rules);

    let root: Vec<String> = graph
        .parents_of(&Identity::source("python27"))
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(root, vec!["BLT:python27"]);

    let tool: Vec<String> = graph
        .parents_of(&Identity::source("tool"))
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(tool, vec!["DEP:python(abi) = 2.7", "BLT:python2-tool"]);
}

#[rstest]
fn lineage_is_the_first_discovery_chain(python_rules: BuilderRules) {
    let graph = build(python_universe(), &python_rules);
    let lineage: Vec<String> = graph
        .lineage_of(&Identity::built("app"))
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        lineage,
        vec![
            "DEP:python2-lib = 1.0",
            "BLT:python2-lib",
            "DEP:python(abi) = 2.7",
            "BLT:python27",
            "SRC:python27",
        ]
    );
}

#[rstest]
fn unreached_packages_are_absent(python_rules: BuilderRules) {
    let graph = build(python_universe(), &python_rules);
    assert_eq!(depth(&graph, "BLT:python3-lib"), None);
    assert_eq!(graph.cache().count(Kind::Source), 4);
    assert_eq!(graph.cache().count(Kind::Built), 4);
    assert_eq!(graph.cache().count(Kind::Capability), 2);
}

#[rstest]
fn records_list_built_then_sources_then_capabilities(python_rules: BuilderRules) {
    let graph = build(python_universe(), &python_rules);
    let rank = |kind: Kind| match kind {
        Kind::Built => 0,
        Kind::Source => 1,
        Kind::Capability => 2,
    };
    let ranks: Vec<u8> = graph.records().iter().map(|record| rank(record.kind)).collect();

    assert!(ranks.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(ranks.len(), graph.cache().len());
}

// ============================================================================
// Memoization
// ============================================================================

#[rstest]
fn every_node_is_queried_once(python_rules: BuilderRules) {
    let backend = CountingBackend::new(snapshot(python_universe()));
    let graph = GraphBuilder::with_configured_roots(&backend, &python_rules)
        .unwrap()
        .build()
        .unwrap();

    let calls = backend.calls();
    for (query, count) in &calls {
        if !query.starts_with("packages_named") {
            assert_eq!(*count, 1, "{query} was asked {count} times");
        }
    }
    assert_eq!(calls["requirers_of:python(abi) = 2.7"], 1);

    let identities: HashSet<&Identity> = graph.cache().nodes().map(|(_, node)| &node.identity).collect();
    assert_eq!(identities.len(), graph.cache().len());
}

#[test]
fn cycles_terminate() {
    let packages = vec![
        src("a", &[]),
        blt("a", "a", &["cap-a"], &["cap-b"]),
        src("b", &[]),
        blt("b", "b", &["cap-b"], &["cap-a"]),
    ];
    let graph = build(packages, &bare_rules(&["BLT:a"]));

    assert_eq!(depth(&graph, "BLT:a"), Some(0));
    assert_eq!(depth(&graph, "DEP:cap-a"), Some(1));
    assert_eq!(depth(&graph, "BLT:b"), Some(2));
    assert_eq!(depth(&graph, "DEP:cap-b"), Some(3));
    let parents: Vec<String> = graph
        .parents_of(&Identity::built("a"))
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(parents, vec!["DEP:cap-b"]);
}

// ============================================================================
// Exclusions
// ============================================================================

#[rstest]
fn excluded_source_is_kept_but_not_traversed(mut python_rules: BuilderRules) {
    python_rules.excluded_sources.insert("tool".to_string());
    let graph = build(python_universe(), &python_rules);

    assert_eq!(depth(&graph, "SRC:tool"), Some(3));
    assert_eq!(depth(&graph, "BLT:python2-tool"), None);
}

#[rstest]
fn terminal_prefix_stops_at_built_package(mut python_rules: BuilderRules) {
    python_rules.terminal_prefixes.push("python2-".to_string());
    let graph = build(python_universe(), &python_rules);

    assert_eq!(depth(&graph, "BLT:python2-lib"), Some(3));
    assert_eq!(depth(&graph, "DEP:python2-lib = 1.0"), None);
    assert_eq!(depth(&graph, "BLT:app"), None);
}

#[rstest]
fn excluded_built_by_source_stops_provides(mut python_rules: BuilderRules) {
    python_rules.excluded_built_by_source.insert("python-lib".to_string());
    let graph = build(python_universe(), &python_rules);

    assert_eq!(depth(&graph, "DEP:python2-lib = 1.0"), None);
}

#[rstest]
fn build_only_source_hides_build_requirers(mut python_rules: BuilderRules) {
    python_rules.build_only_sources.insert("python27".to_string());
    let graph = build(python_universe(), &python_rules);

    let abi = graph.get(&Identity::capability("python(abi) = 2.7")).unwrap();
    assert!(abi.ignore_build_requirers);
    assert_eq!(depth(&graph, "BLT:python2-lib"), Some(3));
    assert_eq!(depth(&graph, "SRC:tool"), None);
}

#[rstest]
fn noise_capability_has_no_requirers(mut python_rules: BuilderRules) {
    python_rules.noise_capabilities.insert("python(abi) = 2.7".to_string());
    let graph = build(python_universe(), &python_rules);

    assert_eq!(graph.cache().len(), 3);
    assert_eq!(depth(&graph, "BLT:python2-lib"), None);
}

#[test]
fn current_family_subpackage_is_suppressed() {
    let graph = build(python_universe(), &bare_rules(&["SRC:python-lib"]));

    assert_eq!(depth(&graph, "BLT:python2-lib"), Some(1));
    assert_eq!(depth(&graph, "BLT:python3-lib"), None);
}

// ============================================================================
// Depth limit and shallow pass
// ============================================================================

#[rstest]
fn depth_limit_defers_to_shallow_pass(mut python_rules: BuilderRules) {
    python_rules.max_depth = Some(2);
    let graph = build(python_universe(), &python_rules);
    let stats = graph.stats();

    assert_eq!(stats.expanded, 2);
    assert_eq!(stats.deferred, 1);
    assert_eq!(stats.shallow_expanded, 1);
    assert_eq!(depth(&graph, "BLT:python2-lib"), Some(3));
    assert_eq!(depth(&graph, "SRC:tool"), Some(3));
    assert!(!graph.get(&Identity::built("python2-lib")).unwrap().is_expanded());
    assert_eq!(depth(&graph, "DEP:python2-lib = 1.0"), None);
    assert_eq!(depth(&graph, "SRC:python-lib"), Some(4));
}

// ============================================================================
// Backend inconsistencies
// ============================================================================

#[test]
fn built_package_without_source_record_aborts() {
    let packages = vec![blt("orphan-bin", "gone", &["cap"], &[])];
    let backend = snapshot(packages);
    let err = GraphBuilder::with_configured_roots(&backend, &bare_rules(&["BLT:orphan-bin"]))
        .unwrap()
        .build()
        .unwrap_err();

    assert!(matches!(err, Error::BackendInconsistency { found: 0, .. }));
}

#[test]
fn ambiguous_root_is_rejected() {
    let backend = snapshot(vec![src("dup", &[]), src("dup", &[])]);
    let rules = bare_rules(&["SRC:dup"]);
    let result = GraphBuilder::with_configured_roots(&backend, &rules);

    assert!(matches!(result, Err(Error::BackendInconsistency { found: 2, .. })));
}

#[test]
fn capability_root_needs_no_backend_record() {
    let packages = vec![src("user", &["libfoo.so"]), blt("user-bin", "user", &[], &[])];
    let graph = build(packages, &bare_rules(&["DEP:libfoo.so"]));

    assert_eq!(depth(&graph, "DEP:libfoo.so"), Some(0));
    assert_eq!(depth(&graph, "SRC:user"), Some(1));
    assert_eq!(depth(&graph, "BLT:user-bin"), Some(2));
}

// ============================================================================
// Properties
// ============================================================================

/// Package `i` provides `cap-i` and requires `cap-j` for each listed `j`.
fn chain_universe(requires: &[Vec<usize>]) -> Vec<deptrace::backend::SnapshotPackage> {
    let n = requires.len();
    let mut packages = Vec::new();
    for (i, wanted) in requires.iter().enumerate() {
        let caps: Vec<String> = wanted.iter().map(|j| format!("cap-{}", j % n)).collect();
        let caps: Vec<&str> = caps.iter().map(String::as_str).collect();
        packages.push(src(&format!("src-{i}"), &[]));
        packages.push(blt(&format!("pkg-{i}"), &format!("src-{i}"), &[format!("cap-{i}").as_str()], &caps));
    }
    packages
}

proptest! {
    #[test]
    fn depth_follows_first_discoverer(
        requires in prop::collection::vec(prop::collection::vec(0usize..8, 0..4), 1..8)
    ) {
        let graph = build(chain_universe(&requires), &bare_rules(&["SRC:src-0"]));
        let cache = graph.cache();

        for (id, node) in cache.nodes() {
            let parents = cache.parents(id);
            if node.lineage.is_empty() {
                prop_assert_eq!(node.depth, 0);
            } else {
                let first = cache.node(parents[0]);
                prop_assert_eq!(node.depth, first.depth + 1);
                prop_assert_eq!(node.lineage[0], parents[0]);
            }
            let distinct: HashSet<_> = parents.iter().collect();
            prop_assert_eq!(distinct.len(), parents.len());
        }
        for (_, node) in cache.nodes() {
            if node.identity.kind() == Kind::Built {
                let source = Identity::source(node.source_name.clone().unwrap());
                prop_assert!(cache.get(&source).is_some());
            }
        }
    }
}
