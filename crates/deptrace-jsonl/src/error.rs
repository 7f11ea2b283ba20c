//! Error types for JSONL encoding and decoding.

use std::io;
use thiserror::Error;

/// The error type for deptrace-jsonl operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading or writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A value could not be serialized to JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A line could not be decoded into the expected record type.
    #[error("line {line_number}: {source}")]
    Parse {
        /// 1-based line number of the offending line.
        line_number: usize,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

/// A specialized Result type for deptrace-jsonl operations.
pub type Result<T> = std::result::Result<T, Error>;
