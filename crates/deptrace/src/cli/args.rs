//! CLI argument structs for all commands.

use std::path::PathBuf;

use clap::Parser;

use crate::domain::Identity;

/// Default node index location.
pub const DEFAULT_INDEX: &str = "dep_graph.jsonl";

/// Arguments for the `build` command
#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    /// Package snapshot, one JSON package per line
    #[arg(short, long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Root identity (`SRC:name`, `BLT:name` or `DEP:capability`)
    ///
    /// Repeatable. Replaces the configured roots when given.
    #[arg(short, long = "root", value_name = "IDENTITY")]
    pub roots: Vec<Identity>,

    /// Where to write the node index
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_INDEX)]
    pub output: PathBuf,

    /// Defer nodes at this depth to the shallow pass
    #[arg(long)]
    pub max_depth: Option<usize>,
}

/// Arguments for the `report` command
#[derive(Parser, Debug, Clone)]
pub struct ReportArgs {
    /// Node index written by `build`
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_INDEX)]
    pub index: PathBuf,

    /// Owners file: `{"rpms": {"name": ["maintainer", ...]}}`
    #[arg(long, value_name = "FILE")]
    pub owners: PathBuf,

    /// Orphan timestamps: `{"name": "2020-01-31T12:00:00"}`
    #[arg(long, value_name = "FILE")]
    pub orphans: Option<PathBuf>,

    /// Only print the report for this maintainer
    ///
    /// Cross-references still account for every other group.
    #[arg(short, long)]
    pub maintainer: Option<String>,
}

/// Arguments for the `components` command
#[derive(Parser, Debug, Clone)]
pub struct ComponentsArgs {
    /// Node index written by `build`
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_INDEX)]
    pub index: PathBuf,
}
