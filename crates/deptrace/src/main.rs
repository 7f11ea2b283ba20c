//! Deptrace CLI binary.

use std::process::ExitCode;

use colored::Colorize;
use deptrace::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the deptrace CLI.
///
/// Uses tokio's current_thread runtime: the graph passes are synchronous and
/// the only async work is sequential file I/O.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // RUST_LOG wins over -v. Logs go to stderr, stdout carries reports.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_directive())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting deptrace CLI");

    match cli.execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            for cause in err.chain().skip(1) {
                eprintln!("  {} {cause}", "caused by:".red());
            }
            ExitCode::FAILURE
        }
    }
}
