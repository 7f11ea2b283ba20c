//! Text formatting of expanded report trees.

use std::fmt;

use super::{LineId, RenderSession};
use crate::domain::{Kind, label};

/// Direction of a cross-reference relative to the referring line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossReference {
    /// The subtree was rendered earlier.
    Above,
    /// The subtree is rendered later.
    Below,
    /// The referenced line is this forest position reached another way.
    ///
    /// Never produced while rendering: line numbers are unique, so a line
    /// and its target always differ.
    Elsewhere,
}

impl CrossReference {
    /// Direction from the line numbered `from` to the line numbered `to`.
    #[must_use]
    pub fn between(from: usize, to: usize) -> Self {
        match to.cmp(&from) {
            std::cmp::Ordering::Less => Self::Above,
            std::cmp::Ordering::Greater => Self::Below,
            std::cmp::Ordering::Equal => Self::Elsewhere,
        }
    }
}

impl fmt::Display for CrossReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Above => "(see above)",
            Self::Below => "(see below)",
            Self::Elsewhere => "(see elsewhere)",
        })
    }
}

/// Phrase introducing a `child` line under a `parent` line.
///
/// Roots get no phrase. The kind pairs that cannot come out of the builder
/// fall back to a neutral phrase.
#[must_use]
pub fn relationship_phrase(parent: Option<Kind>, child: Kind) -> &'static str {
    match (parent, child) {
        (None, _) => "",
        (Some(Kind::Source), Kind::Built) => "which contains ",
        (Some(Kind::Source), Kind::Capability) => "which buildrequires ",
        (Some(Kind::Built), Kind::Capability) => "which requires ",
        (Some(Kind::Built), Kind::Source) => "part of component ",
        (Some(Kind::Capability), Kind::Built) => "provided by ",
        _ => "linked to ",
    }
}

/// Kind pairs whose same-label lines are noise:
/// a requirement met by the package of that name, a built package named
/// after its source, a component named after its built package.
fn collapsible(parent: Kind, child: Kind) -> bool {
    matches!(
        (parent, child),
        (Kind::Capability, Kind::Built) | (Kind::Source, Kind::Built) | (Kind::Built, Kind::Source)
    )
}

impl RenderSession<'_> {
    /// Append the line `id` and its subtree to `out`.
    pub(super) fn print_line(&self, id: LineId, indent: usize, out: &mut Vec<String>) {
        let line = &self.lines[id.0];

        if line.cross_reference.is_none()
            && let Some(parent) = line.parent
            && self.splices_into(parent, id)
        {
            for &child in &line.children {
                self.print_line(child, indent, out);
            }
            return;
        }

        let phrase = relationship_phrase(line.parent.map(|p| self.kind_of(p)), line.record.kind);
        let mut text = format!("{}- {phrase}{}", "  ".repeat(indent), line.record.name);

        if let Some(target) = line.cross_reference {
            let direction = CrossReference::between(line.number, self.lines[target.0].number);
            text.push(' ');
            text.push_str(&direction.to_string());
        } else if line.record.kind == Kind::Source {
            self.push_orphan_note(&line.record.name, &mut text);
        }
        out.push(text);

        for &child in &line.children {
            self.print_line(child, indent + 1, out);
        }
    }

    /// Same-label noise lines print their children in their place.
    fn splices_into(&self, parent: LineId, id: LineId) -> bool {
        let parent = self.lines[parent.0].record;
        let child = self.lines[id.0].record;
        collapsible(parent.kind, child.kind) && label(&parent.name) == label(&child.name)
    }

    fn push_orphan_note(&self, name: &str, text: &mut String) {
        let orphaned = self
            .metadata
            .maintainers_of(name)
            .iter()
            .any(|m| *m == self.rules.orphan_marker);
        if !orphaned {
            return;
        }
        match self.metadata.orphaned_since(name) {
            Some(since) => {
                let days = (self.now - since).num_days();
                text.push_str(&format!(" (orphaned for {days} days)"));
            }
            None => text.push_str(" (orphaned)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, Kind::Source, "")]
    #[case(Some(Kind::Source), Kind::Built, "which contains ")]
    #[case(Some(Kind::Source), Kind::Capability, "which buildrequires ")]
    #[case(Some(Kind::Built), Kind::Capability, "which requires ")]
    #[case(Some(Kind::Built), Kind::Source, "part of component ")]
    #[case(Some(Kind::Capability), Kind::Built, "provided by ")]
    #[case(Some(Kind::Capability), Kind::Source, "linked to ")]
    fn phrases_by_kind_pair(
        #[case] parent: Option<Kind>,
        #[case] child: Kind,
        #[case] expected: &str,
    ) {
        assert_eq!(relationship_phrase(parent, child), expected);
    }

    #[rstest]
    #[case(5, 2, CrossReference::Above)]
    #[case(2, 5, CrossReference::Below)]
    #[case(3, 3, CrossReference::Elsewhere)]
    fn cross_reference_direction(#[case] from: usize, #[case] to: usize, #[case] expected: CrossReference) {
        assert_eq!(CrossReference::between(from, to), expected);
    }

    #[test]
    fn only_noise_pairs_collapse() {
        assert!(collapsible(Kind::Source, Kind::Built));
        assert!(collapsible(Kind::Built, Kind::Source));
        assert!(collapsible(Kind::Capability, Kind::Built));
        assert!(!collapsible(Kind::Built, Kind::Capability));
        assert!(!collapsible(Kind::Source, Kind::Capability));
    }
}
