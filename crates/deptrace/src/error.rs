//! Error types for deptrace.
//!
//! Backend inconsistencies and unknown identities are fatal: a graph built
//! on a guess, or a report rendered from a stale index, is worse than no
//! output. Missing maintainer metadata is not an error at all; it is
//! rendered with a sentinel maintainer (see [`crate::report::Metadata`]).

use std::io;
use thiserror::Error;

use crate::domain::Identity;

/// The error type for deptrace operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON input could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A JSONL file could not be read or written.
    #[error("JSONL error: {0}")]
    Jsonl(#[from] deptrace_jsonl::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Text that should be a `TAG:name` identity is not one.
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// A repository snapshot is internally inconsistent.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// A query that must match exactly one record matched zero or many.
    #[error("Backend inconsistency: expected exactly one {query}, found {found}")]
    BackendInconsistency {
        /// Description of the query, e.g. `source package 'foo'`.
        query: String,
        /// Number of records returned.
        found: usize,
    },

    /// The node index has no record for an identity it refers to.
    #[error("Unknown identity {0}: node index is stale or incomplete")]
    UnknownIdentity(Identity),

    /// The node index contains an unusable record.
    #[error("Invalid node index: {0}")]
    InvalidIndex(String),
}

/// A specialized Result type for deptrace operations.
pub type Result<T> = std::result::Result<T, Error>;
