//! Command execution logic.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::Serialize;

use super::args::{BuildArgs, ComponentsArgs, ReportArgs};
use crate::backend::SnapshotBackend;
use crate::builder::{BuildStats, GraphBuilder};
use crate::components::{component_edges, render_dot};
use crate::config::DeptraceConfig;
use crate::domain::Kind;
use crate::index::{NodeIndex, save_index};
use crate::output::{self, OutputMode};
use crate::report::{Metadata, RenderSession, maintainer_groups};

/// Result of a `build` run.
#[derive(Debug, Serialize)]
struct BuildSummary {
    output: PathBuf,
    nodes: usize,
    sources: usize,
    built: usize,
    capabilities: usize,
    stats: BuildStats,
}

/// Execute the build command
pub async fn execute_build(
    config: &DeptraceConfig,
    args: &BuildArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let mut rules = config.builder.clone();
    if !args.roots.is_empty() {
        rules.roots.clone_from(&args.roots);
    }
    if args.max_depth.is_some() {
        rules.max_depth = args.max_depth;
    }
    if rules.roots.is_empty() {
        bail!("no roots to build from; pass --root or configure builder.roots");
    }

    let backend = SnapshotBackend::load(&args.snapshot)
        .await
        .with_context(|| format!("failed to load snapshot {}", args.snapshot.display()))?;

    let graph = GraphBuilder::with_configured_roots(&backend, &rules)?.build()?;
    let records = graph.records();
    save_index(&args.output, &records)
        .await
        .with_context(|| format!("failed to write node index {}", args.output.display()))?;

    let cache = graph.cache();
    let summary = BuildSummary {
        output: args.output.clone(),
        nodes: records.len(),
        sources: cache.count(Kind::Source),
        built: cache.count(Kind::Built),
        capabilities: cache.count(Kind::Capability),
        stats: graph.stats(),
    };

    match output_mode {
        OutputMode::Text => {
            output::print_message(&format!(
                "Wrote {} nodes to {} ({} sources, {} built, {} capabilities)",
                summary.nodes,
                summary.output.display(),
                summary.sources,
                summary.built,
                summary.capabilities
            ))?;
            if summary.stats.deferred > 0 {
                output::print_message(&format!(
                    "  {} nodes deferred past max depth, {} capabilities expanded shallowly",
                    summary.stats.deferred, summary.stats.shallow_expanded
                ))?;
            }
        }
        OutputMode::Json => output::print_json(&summary)?,
    }
    Ok(())
}

/// Execute the report command
pub async fn execute_report(
    config: &DeptraceConfig,
    args: &ReportArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let rules = &config.report;
    let index = NodeIndex::load(&args.index, &rules.pinned)
        .await
        .with_context(|| format!("failed to load node index {}", args.index.display()))?;
    let metadata = Metadata::load(&args.owners, args.orphans.as_deref(), &rules.unknown_maintainer)
        .await
        .context("failed to load maintainer metadata")?;

    let groups = maintainer_groups(&index, &metadata);
    if let Some(wanted) = &args.maintainer
        && !groups.contains_key(wanted)
    {
        bail!("maintainer '{wanted}' owns no affected package");
    }

    let mut session = RenderSession::new(&index, rules, &metadata, Utc::now());
    let mut reports = session.render_all(&groups)?;
    if let Some(wanted) = &args.maintainer {
        reports.retain(|report| &report.maintainer == wanted);
    }

    output::print_reports(&reports, output_mode)?;
    Ok(())
}

/// Execute the components command
pub async fn execute_components(
    config: &DeptraceConfig,
    args: &ComponentsArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let pinned = &config.report.pinned;
    let index = NodeIndex::load(&args.index, pinned)
        .await
        .with_context(|| format!("failed to load node index {}", args.index.display()))?;
    let edges = component_edges(&index, pinned)?;

    match output_mode {
        OutputMode::Text => print!("{}", render_dot(&edges)),
        OutputMode::Json => output::print_json(&edges)?,
    }
    Ok(())
}

/// Execute the config command
pub fn execute_config(config: &DeptraceConfig, output_mode: OutputMode) -> Result<()> {
    match output_mode {
        OutputMode::Text => print!("{}", config.to_yaml()?),
        OutputMode::Json => output::print_json(config)?,
    }
    Ok(())
}
