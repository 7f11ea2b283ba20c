//! Per-maintainer ancestry reports.
//!
//! A report explains, for every source package a maintainer owns, the
//! shortest chains through which it depends on a legacy root. Each package
//! is a root of a tree whose children are the node's parents in the index
//! (its discoverers), restricted to those at minimum depth.
//!
//! Rendering is cycle-safe and deduplicating: the first line to wrap an
//! identity owns the subtree, and every later line for the same identity
//! becomes a leaf pointing back at it ("see above" / "see below"). The memo
//! and the line numbering span the whole [`RenderSession`], so pointers
//! also work across maintainer groups.
//!
//! ```text
//! - python-six
//!   - which contains python2-six
//!     - which requires python(abi) = 2.7
//! ```

mod metadata;
mod render;

pub use metadata::{Metadata, OwnersFile, maintainer_groups, parse_timestamp};
pub use render::{CrossReference, relationship_phrase};

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ReportRules;
use crate::domain::{Identity, Kind};
use crate::error::Result;
use crate::index::{NodeIndex, NodeRecord};

/// Index of a line in a session's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineId(usize);

/// A node as placed in a report tree.
#[derive(Debug, Clone)]
pub struct ReportLine<'a> {
    /// The index record this line wraps.
    pub record: &'a NodeRecord,
    /// Tree parent; `None` for report roots.
    pub parent: Option<LineId>,
    /// Lines for the record's minimum-depth parents.
    pub children: Vec<LineId>,
    /// First line of the session wrapping the same identity.
    pub cross_reference: Option<LineId>,
    /// Pre-order position within the session.
    pub number: usize,
    /// Legacy marker: explains the chain, never expanded.
    pub terminal: bool,
}

/// One maintainer's rendered report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaintainerReport {
    /// Maintainer name.
    pub maintainer: String,
    /// Owned source packages, sorted.
    pub packages: Vec<String>,
    /// Rendered tree lines.
    pub lines: Vec<String>,
}

/// A rendering session over one node index.
///
/// Owns the line arena, the identity memo and the render-number counter.
/// Render every group of one run through the same session.
pub struct RenderSession<'a> {
    index: &'a NodeIndex,
    rules: &'a ReportRules,
    metadata: &'a Metadata,
    pinned: HashSet<&'a Identity>,
    now: DateTime<Utc>,
    lines: Vec<ReportLine<'a>>,
    memo: HashMap<&'a Identity, LineId>,
    next_number: usize,
}

impl<'a> RenderSession<'a> {
    /// Start a session. `now` is used for orphan ages.
    #[must_use]
    pub fn new(
        index: &'a NodeIndex,
        rules: &'a ReportRules,
        metadata: &'a Metadata,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            index,
            rules,
            metadata,
            pinned: rules.pinned.iter().collect(),
            now,
            lines: Vec::new(),
            memo: HashMap::new(),
            next_number: 0,
        }
    }

    /// Render every group, in map order.
    ///
    /// # Errors
    ///
    /// Stops at the first group that fails; see
    /// [`render_group`](Self::render_group).
    pub fn render_all(
        &mut self,
        groups: &BTreeMap<String, Vec<String>>,
    ) -> Result<Vec<MaintainerReport>> {
        let mut reports = Vec::with_capacity(groups.len());
        for (maintainer, packages) in groups {
            reports.push(self.render_group(maintainer, packages)?);
        }
        tracing::info!(reports = reports.len(), lines = self.lines.len(), "rendered reports");
        Ok(reports)
    }

    /// Render one maintainer's packages.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnknownIdentity`] if a package or any parent
    /// reached while expanding is missing from the index.
    pub fn render_group(&mut self, maintainer: &str, packages: &[String]) -> Result<MaintainerReport> {
        let mut packages = packages.to_vec();
        packages.sort();
        packages.dedup();

        let roots = self.plant(&packages)?;
        self.assign_numbers(&roots);

        let mut lines = Vec::new();
        for &root in &roots {
            self.print_line(root, 0, &mut lines);
        }
        tracing::debug!(maintainer, packages = packages.len(), lines = lines.len(), "rendered group");

        Ok(MaintainerReport {
            maintainer: maintainer.to_string(),
            packages,
            lines,
        })
    }

    /// Create and fully expand the root lines for `packages`.
    fn plant(&mut self, packages: &[String]) -> Result<Vec<LineId>> {
        let mut roots = Vec::with_capacity(packages.len());
        for name in packages {
            let record = self.index.get(&Identity::source(name.clone()))?;
            roots.push(self.push_line(record, None));
        }

        let mut queue: VecDeque<LineId> = roots.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            queue.extend(self.expand(id)?);
        }
        Ok(roots)
    }

    fn push_line(&mut self, record: &'a NodeRecord, parent: Option<LineId>) -> LineId {
        let id = LineId(self.lines.len());
        self.lines.push(ReportLine {
            record,
            parent,
            children: Vec::new(),
            cross_reference: None,
            number: 0,
            terminal: false,
        });
        id
    }

    /// Expand one line, returning the children to expand next.
    fn expand(&mut self, id: LineId) -> Result<Vec<LineId>> {
        let record = self.lines[id.0].record;

        if self.is_terminal(record) {
            self.lines[id.0].terminal = true;
            return Ok(Vec::new());
        }

        if let Some(&first) = self.memo.get(&record.identity) {
            self.lines[id.0].cross_reference = Some(first);
            return Ok(Vec::new());
        }
        self.memo.insert(&record.identity, id);

        let parents = record
            .parents
            .iter()
            .map(|parent| self.index.get(parent))
            .collect::<Result<Vec<&NodeRecord>>>()?;
        let Some(min_depth) = parents.iter().map(|parent| parent.depth).min() else {
            return Ok(Vec::new());
        };
        let mut nearest: Vec<&'a NodeRecord> = parents
            .into_iter()
            .filter(|parent| parent.depth == min_depth)
            .collect();
        nearest.sort_by(|a, b| a.identity.cmp(&b.identity));
        nearest.dedup_by(|a, b| a.identity == b.identity);

        let children: Vec<LineId> = nearest
            .into_iter()
            .map(|parent| self.push_line(parent, Some(id)))
            .collect();
        self.lines[id.0].children.clone_from(&children);
        Ok(children)
    }

    /// Whether `record` is a legacy marker that ends a chain.
    fn is_terminal(&self, record: &NodeRecord) -> bool {
        if self.pinned.contains(&record.identity) {
            return true;
        }
        if self
            .rules
            .legacy_identity_prefixes
            .iter()
            .any(|prefix| record.identity.starts_with(prefix))
        {
            return true;
        }
        !self.rules.legacy_name_prefix.is_empty()
            && record.name.starts_with(self.rules.legacy_name_prefix.as_str())
            && record.parents.iter().any(|parent| self.pinned.contains(parent))
    }

    /// Number lines pre-order, continuing the session counter.
    fn assign_numbers(&mut self, roots: &[LineId]) {
        let mut stack: Vec<LineId> = roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            self.lines[id.0].number = self.next_number;
            self.next_number += 1;
            stack.extend(self.lines[id.0].children.iter().rev().copied());
        }
    }

    /// A line of the session.
    #[must_use]
    pub fn line(&self, id: LineId) -> &ReportLine<'a> {
        &self.lines[id.0]
    }

    /// Number of lines created so far (rendered or spliced).
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn kind_of(&self, id: LineId) -> Kind {
        self.lines[id.0].record.kind
    }
}
