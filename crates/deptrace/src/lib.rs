//! Deptrace - find everything that still depends on a legacy component.
//!
//! The crate has two passes connected by a persisted node index:
//!
//! 1. [`builder::GraphBuilder`] walks a package universe breadth-first from
//!    one or more legacy roots, asking a [`backend::PackageBackend`] for
//!    edges, and records every reachable node with its discovery depth and
//!    all of its discoverers.
//! 2. [`report::RenderSession`] loads that index and renders, per
//!    maintainer, the shortest chains explaining why each of their
//!    packages is affected.

#![forbid(unsafe_code)]

pub mod backend;
pub mod builder;
pub mod cli;
pub mod components;
pub mod config;
pub mod domain;
pub mod error;
pub mod index;
pub mod output;
pub mod report;

pub use domain::{Identity, Kind};
pub use error::{Error, Result};
