//! Maintainer ownership and orphan-age metadata.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use tokio::fs;

use crate::domain::Kind;
use crate::error::Result;
use crate::index::NodeIndex;

/// Ownership file layout: `{"rpms": {"name": ["maintainer", ...]}}`.
#[derive(Debug, Default, Deserialize)]
pub struct OwnersFile {
    /// Maintainers per package name.
    #[serde(default)]
    pub rpms: HashMap<String, Vec<String>>,
}

/// Maintainers of record and orphan timestamps per package name.
#[derive(Debug, Clone)]
pub struct Metadata {
    owners: HashMap<String, Vec<String>>,
    orphaned_since: HashMap<String, DateTime<Utc>>,
    unknown: Vec<String>,
}

impl Metadata {
    /// Build metadata; packages without owners map to `unknown_maintainer`.
    #[must_use]
    pub fn new(
        owners: HashMap<String, Vec<String>>,
        orphaned_since: HashMap<String, DateTime<Utc>>,
        unknown_maintainer: &str,
    ) -> Self {
        Self {
            owners,
            orphaned_since,
            unknown: vec![unknown_maintainer.to_string()],
        }
    }

    /// Load the owners file and, if given, the orphan timestamp file.
    ///
    /// Unparseable timestamps are logged and treated as unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or is not valid JSON.
    pub async fn load(
        owners_path: &Path,
        orphans_path: Option<&Path>,
        unknown_maintainer: &str,
    ) -> Result<Self> {
        let owners: OwnersFile = serde_json::from_str(&fs::read_to_string(owners_path).await?)?;
        let mut orphaned_since = HashMap::new();
        if let Some(path) = orphans_path {
            let raw: HashMap<String, String> =
                serde_json::from_str(&fs::read_to_string(path).await?)?;
            for (name, text) in raw {
                match parse_timestamp(&text) {
                    Some(since) => {
                        orphaned_since.insert(name, since);
                    }
                    None => {
                        tracing::warn!(package = %name, timestamp = %text, "unparseable orphan timestamp");
                    }
                }
            }
        }
        Ok(Self::new(owners.rpms, orphaned_since, unknown_maintainer))
    }

    /// Maintainers of `name`, or the unknown-maintainer sentinel.
    #[must_use]
    pub fn maintainers_of(&self, name: &str) -> &[String] {
        match self.owners.get(name) {
            Some(maintainers) if !maintainers.is_empty() => maintainers,
            _ => &self.unknown,
        }
    }

    /// Whether ownership data exists for `name`.
    #[must_use]
    pub fn has_owners(&self, name: &str) -> bool {
        self.owners.get(name).is_some_and(|m| !m.is_empty())
    }

    /// When `name` was orphaned, if known.
    #[must_use]
    pub fn orphaned_since(&self, name: &str) -> Option<DateTime<Utc>> {
        self.orphaned_since.get(name).copied()
    }
}

/// Parse an RFC 3339 timestamp, a naive ISO-8601 date-time or a bare date.
/// Naive values are taken as UTC.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Group every source package of the index by maintainer.
///
/// Maintainers are sorted; each maintainer's packages are sorted by name.
/// Packages without ownership data go to the unknown-maintainer group.
#[must_use]
pub fn maintainer_groups(index: &NodeIndex, metadata: &Metadata) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut gaps = 0usize;
    for record in index.sorted_of_kind(Kind::Source) {
        if !metadata.has_owners(&record.name) {
            gaps += 1;
            tracing::debug!(package = %record.name, "no maintainer of record");
        }
        let mut seen: Vec<&str> = Vec::new();
        for maintainer in metadata.maintainers_of(&record.name) {
            if seen.contains(&maintainer.as_str()) {
                continue;
            }
            seen.push(maintainer);
            groups
                .entry(maintainer.clone())
                .or_default()
                .push(record.name.clone());
        }
    }
    if gaps > 0 {
        tracing::warn!(packages = gaps, "source packages without ownership data");
    }
    groups
}
