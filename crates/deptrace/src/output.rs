//! Output formatting for CLI commands.
//!
//! Every command prints either plain text for people or JSON for
//! programmatic use. Writers take any [`Write`] so the formats can be
//! tested against a buffer.

use std::io::{self, Write};

use serde::Serialize;

use crate::report::MaintainerReport;

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

impl OutputMode {
    /// Mode selected by the global `--json` flag.
    #[must_use]
    pub fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

/// Print maintainer reports in the specified format
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn print_reports(reports: &[MaintainerReport], mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match mode {
        OutputMode::Text => write_reports_text(&mut handle, reports),
        OutputMode::Json => write_json(&mut handle, reports),
    }
}

/// Write reports as text: one `###`-separated section per maintainer,
/// followed by a summary line.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_reports_text<W: Write>(w: &mut W, reports: &[MaintainerReport]) -> io::Result<()> {
    for report in reports {
        let count = report.packages.len();
        let plural = if count == 1 { "" } else { "s" };
        writeln!(w)?;
        writeln!(w, "###")?;
        writeln!(w)?;
        writeln!(w, "Maintainer: {} ({count} package{plural})", report.maintainer)?;
        writeln!(w)?;
        for line in &report.lines {
            writeln!(w, "{line}")?;
        }
    }
    writeln!(w)?;
    writeln!(w, "###")?;
    writeln!(w)?;
    writeln!(w, "{} reports generated", reports.len())
}

/// Print a simple message
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn print_message(msg: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{msg}")
}

/// Print a JSON-formatted result for any serializable value
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json(&mut handle, value)
}

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(maintainer: &str, packages: &[&str], lines: &[&str]) -> MaintainerReport {
        MaintainerReport {
            maintainer: maintainer.to_string(),
            packages: packages.iter().map(ToString::to_string).collect(),
            lines: lines.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn text_sections_have_separator_and_heading() {
        let reports = vec![
            report("alice", &["a", "b"], &["- a", "- b"]),
            report("bob", &["c"], &["- c"]),
        ];
        let mut buffer = Vec::new();

        write_reports_text(&mut buffer, &reports).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(
            output,
            "\n###\n\nMaintainer: alice (2 packages)\n\n- a\n- b\n\
             \n###\n\nMaintainer: bob (1 package)\n\n- c\n\
             \n###\n\n2 reports generated\n"
        );
    }

    #[test]
    fn json_is_a_list_of_reports() {
        let mut buffer = Vec::new();

        write_json(&mut buffer, &[report("alice", &["a"], &["- a"])]).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value[0]["maintainer"], "alice");
        assert_eq!(value[0]["packages"][0], "a");
        assert_eq!(value[0]["lines"][0], "- a");
    }

    #[test]
    fn json_flag_selects_mode() {
        assert_eq!(OutputMode::from_json_flag(true), OutputMode::Json);
        assert_eq!(OutputMode::from_json_flag(false), OutputMode::Text);
    }
}
