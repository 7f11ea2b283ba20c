//! Node kinds and identities shared by the builder and the renderer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Kind of a dependency graph node.
///
/// Variant order matches the textual tags, so sorting identities by
/// `(kind, name)` gives the same order as sorting their `TAG:name` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    /// An installable package built from a source package.
    #[serde(rename = "BLT")]
    Built,

    /// A named provide/require relation.
    #[serde(rename = "DEP")]
    Capability,

    /// A buildable source package (a component).
    #[serde(rename = "SRC")]
    Source,
}

impl Kind {
    /// The literal tag used in identities and node index records.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Built => "BLT",
            Self::Capability => "DEP",
            Self::Source => "SRC",
        }
    }

    /// Parses a literal tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "BLT" => Some(Self::Built),
            "DEP" => Some(Self::Capability),
            "SRC" => Some(Self::Source),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Globally unique name of a node: its kind plus its name.
///
/// The textual form is `TAG:name`, e.g. `SRC:python27` or
/// `DEP:python(abi) = 2.7`. Names may themselves contain `:`; only the first
/// one separates the tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    kind: Kind,
    name: String,
}

impl Identity {
    /// Create an identity from its parts.
    pub fn new(kind: Kind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Identity of a source artifact.
    pub fn source(name: impl Into<String>) -> Self {
        Self::new(Kind::Source, name)
    }

    /// Identity of a built artifact.
    pub fn built(name: impl Into<String>) -> Self {
        Self::new(Kind::Built, name)
    }

    /// Identity of a capability.
    pub fn capability(name: impl Into<String>) -> Self {
        Self::new(Kind::Capability, name)
    }

    /// The node kind.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The node name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the `TAG:name` form starts with `prefix`.
    #[must_use]
    pub fn starts_with(&self, prefix: &str) -> bool {
        match prefix.split_once(':') {
            Some((tag, rest)) => tag == self.kind.tag() && self.name.starts_with(rest),
            None => self.kind.tag().starts_with(prefix),
        }
    }
}

/// Display label of a node name: everything before the first `" = "`.
///
/// `python(abi) = 2.7` is labelled `python(abi)`; names without a version
/// are their own label.
#[must_use]
pub fn label(name: &str) -> &str {
    name.split_once(" = ").map_or(name, |(label, _)| label)
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.tag(), self.name)
    }
}

impl FromStr for Identity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, name) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidIdentity(format!("missing kind tag in '{s}'")))?;
        let kind = Kind::from_tag(tag).ok_or_else(|| {
            Error::InvalidIdentity(format!("unknown kind tag '{tag}' in '{s}'"))
        })?;
        if name.is_empty() {
            return Err(Error::InvalidIdentity(format!("empty name in '{s}'")));
        }
        Ok(Self::new(kind, name))
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
