//! The persisted node index handed from the builder to the renderer.
//!
//! One JSON record per line:
//!
//! ```json
//! {"identity":"BLT:python2-six","name":"python2-six","kind":"BLT","depth":3,"parents":["DEP:python(abi) = 2.7"]}
//! ```
//!
//! The index is self-contained: rendering replays it without touching the
//! backend.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use deptrace_jsonl::{read_jsonl, write_jsonl_atomic};
use serde::{Deserialize, Serialize};

use crate::domain::{Identity, Kind};
use crate::error::{Error, Result};

/// One node of the persisted index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// `TAG:name` identity.
    pub identity: Identity,
    /// Node name.
    pub name: String,
    /// Node kind.
    pub kind: Kind,
    /// First-discovery depth.
    pub depth: usize,
    /// Identities of every discoverer.
    pub parents: Vec<Identity>,
}

/// Node records keyed by identity, ready for rendering.
#[derive(Debug, Default)]
pub struct NodeIndex {
    records: HashMap<Identity, NodeRecord>,
}

impl NodeIndex {
    /// Build an index, forcing `pinned` identities to depth 0.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIndex`] if an identity appears twice or a
    /// record's identity disagrees with its `kind` or `name`.
    pub fn from_records(
        records: impl IntoIterator<Item = NodeRecord>,
        pinned: &[Identity],
    ) -> Result<Self> {
        let mut map = HashMap::new();
        for record in records {
            if record.identity.kind() != record.kind || record.identity.name() != record.name {
                return Err(Error::InvalidIndex(format!(
                    "record {} has kind {} and name '{}'",
                    record.identity, record.kind, record.name
                )));
            }
            if let Some(previous) = map.insert(record.identity.clone(), record) {
                return Err(Error::InvalidIndex(format!(
                    "duplicate record for {}",
                    previous.identity
                )));
            }
        }

        let pinned: HashSet<&Identity> = pinned.iter().collect();
        for identity in pinned {
            match map.get_mut(identity) {
                Some(record) => record.depth = 0,
                None => tracing::debug!(identity = %identity, "pinned identity not in index"),
            }
        }
        Ok(Self { records: map })
    }

    /// Load an index file.
    ///
    /// Every line must decode. A truncated record would silently drop a
    /// node and every report that passes through it, so it fails the load.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIndex`] naming the line if a record does not
    /// decode, an I/O error if the file cannot be read, or any error of
    /// [`from_records`](Self::from_records).
    pub async fn load(path: &Path, pinned: &[Identity]) -> Result<Self> {
        let records = read_jsonl::<NodeRecord, _>(path).await.map_err(|e| match e {
            deptrace_jsonl::Error::Parse { .. } => {
                Error::InvalidIndex(format!("{}: {e}", path.display()))
            }
            other => Error::Jsonl(other),
        })?;
        let index = Self::from_records(records, pinned)?;
        tracing::info!(path = %path.display(), nodes = index.len(), "loaded node index");
        Ok(index)
    }

    /// The record for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownIdentity`] if the index has no such record.
    pub fn get(&self, identity: &Identity) -> Result<&NodeRecord> {
        self.records
            .get(identity)
            .ok_or_else(|| Error::UnknownIdentity(identity.clone()))
    }

    /// Whether the index has a record for `identity`.
    #[must_use]
    pub fn contains(&self, identity: &Identity) -> bool {
        self.records.contains_key(identity)
    }

    /// All records, in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &NodeRecord> {
        self.records.values()
    }

    /// Records of `kind`, sorted by identity.
    #[must_use]
    pub fn sorted_of_kind(&self, kind: Kind) -> Vec<&NodeRecord> {
        let mut records: Vec<&NodeRecord> = self
            .records
            .values()
            .filter(|record| record.kind == kind)
            .collect();
        records.sort_by(|a, b| a.identity.cmp(&b.identity));
        records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Write node records atomically, one per line. Returns the record count.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub async fn save_index(path: &Path, records: &[NodeRecord]) -> Result<usize> {
    let written = write_jsonl_atomic(path, records).await?;
    tracing::info!(path = %path.display(), nodes = written, "wrote node index");
    Ok(written)
}
