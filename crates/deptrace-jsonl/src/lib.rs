//! Line-delimited JSON (JSONL) records for deptrace.
//!
//! Every persisted artifact of a deptrace run is a sequence of self-contained
//! JSON objects, one per line: the repository snapshot fed to the graph
//! builder and the node index handed to the renderer. This crate provides the
//! async reader and writer for those files, resilient loading that skips
//! malformed lines, and crash-safe whole-file writes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod reader;
pub mod warning;
pub mod writer;

pub use atomic::{write_jsonl_atomic, write_jsonl_atomic_iter};
pub use error::{Error, Result};
pub use reader::{JsonlReader, read_jsonl, read_jsonl_resilient};
pub use warning::Warning;
pub use writer::JsonlWriter;
