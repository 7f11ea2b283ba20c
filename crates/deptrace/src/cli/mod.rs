//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `build`: walk a package snapshot from the legacy roots and write the node index
//! - `report`: render per-maintainer ancestry reports from a node index
//! - `components`: print source-to-source component edges as a Graphviz digraph
//! - `config`: print the effective configuration
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//! - `--config`: configuration file (default: `deptrace.yaml` if present)
//! - `-v`: more log output on stderr, repeatable
//!
//! # Example
//!
//! ```bash
//! deptrace build --snapshot packages.jsonl --output dep_graph.jsonl
//! deptrace report --index dep_graph.jsonl --owners owners.json --orphans orphans.json
//! deptrace components --index dep_graph.jsonl | dot -Tsvg > components.svg
//! ```

mod args;
mod execute;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};

pub use args::{BuildArgs, ComponentsArgs, ReportArgs};

use crate::config::DeptraceConfig;
use crate::output::OutputMode;

/// Deptrace - find everything that still depends on a legacy component
///
/// Builds a dependency graph from a package snapshot, then explains per
/// maintainer why each affected package still pulls in the legacy root.
#[derive(Parser, Debug)]
#[command(name = "deptrace")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build the node index
    ///
    /// Walks the snapshot breadth-first from the configured roots and writes
    /// every reachable node with its depth and discoverers.
    Build(BuildArgs),

    /// Render maintainer reports
    ///
    /// Groups affected source packages by maintainer and prints the
    /// shortest chains that tie each one to the legacy root.
    Report(ReportArgs),

    /// Print component edges as a Graphviz digraph
    Components(ComponentsArgs),

    /// Print the effective configuration as YAML
    Config,
}

impl Cli {
    /// Parse CLI arguments from command line
    #[must_use]
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Log filter directive for the `-v` count.
    #[must_use]
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns any configuration, I/O or graph error, with context.
    pub async fn execute(&self) -> Result<()> {
        let output_mode = OutputMode::from_json_flag(self.json);
        let config = DeptraceConfig::load_or_default(self.config.as_deref())
            .await
            .context("failed to load configuration")?;

        match &self.command {
            Commands::Build(args) => execute::execute_build(&config, args, output_mode).await,
            Commands::Report(args) => execute::execute_report(&config, args, output_mode).await,
            Commands::Components(args) => {
                execute::execute_components(&config, args, output_mode).await
            }
            Commands::Config => execute::execute_config(&config, output_mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Identity;
    use rstest::rstest;

    #[test]
    fn build_defaults() {
        let cli = Cli::try_parse_from(["deptrace", "build", "--snapshot", "pkgs.jsonl"]).unwrap();
        let Commands::Build(args) = cli.command else {
            panic!("expected build command");
        };
        assert_eq!(args.snapshot, PathBuf::from("pkgs.jsonl"));
        assert_eq!(args.output, PathBuf::from("dep_graph.jsonl"));
        assert!(args.roots.is_empty());
        assert_eq!(args.max_depth, None);
    }

    #[test]
    fn roots_parse_as_identities() {
        let cli = Cli::try_parse_from([
            "deptrace",
            "build",
            "--snapshot",
            "pkgs.jsonl",
            "--root",
            "SRC:python27",
            "--root",
            "DEP:python(abi) = 2.7",
        ])
        .unwrap();
        let Commands::Build(args) = cli.command else {
            panic!("expected build command");
        };
        assert_eq!(
            args.roots,
            vec![
                Identity::source("python27"),
                Identity::capability("python(abi) = 2.7")
            ]
        );
    }

    #[test]
    fn malformed_root_is_rejected() {
        let result =
            Cli::try_parse_from(["deptrace", "build", "--snapshot", "p", "--root", "python27"]);
        assert!(result.is_err());
    }

    #[test]
    fn report_requires_owners() {
        assert!(Cli::try_parse_from(["deptrace", "report"]).is_err());
        let cli = Cli::try_parse_from(["deptrace", "report", "--owners", "o.json", "--json"]).unwrap();
        assert!(cli.json);
    }

    #[rstest]
    #[case(&["deptrace", "config"], "warn")]
    #[case(&["deptrace", "-v", "config"], "info")]
    #[case(&["deptrace", "config", "-vv"], "debug")]
    #[case(&["deptrace", "-vvvv", "config"], "trace")]
    fn verbosity_selects_log_level(#[case] argv: &[&str], #[case] expected: &str) {
        let cli = Cli::try_parse_from(argv).unwrap();
        assert_eq!(cli.log_directive(), expected);
    }
}
