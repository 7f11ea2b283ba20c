//! Configuration for deptrace runs.
//!
//! The exclusion and legacy-marker rules are hand-curated and change as a
//! migration progresses, so they live in a versioned YAML document instead
//! of the traversal code. [`DeptraceConfig::default`] carries the rules for
//! the Python 2 retirement; a file only needs the keys it changes.
//!
//! ```yaml
//! version: 1
//! builder:
//!   roots: ["SRC:python27"]
//!   excluded-sources: [boost, vtk]
//! report:
//!   legacy-name-prefix: "python2-"
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::domain::Identity;
use crate::error::{Error, Result};

/// Configuration schema version understood by this build.
pub const CONFIG_VERSION: u32 = 1;

/// Default configuration file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "deptrace.yaml";

/// Root configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct DeptraceConfig {
    /// Schema version; must equal [`CONFIG_VERSION`].
    pub version: u32,

    /// Graph construction rules.
    pub builder: BuilderRules,

    /// Report rendering rules.
    pub report: ReportRules,
}

/// Rules applied while expanding the dependency graph.
///
/// Every list is matched by exact name, except `terminal-prefixes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuilderRules {
    /// Identities the breadth-first walk starts from.
    pub roots: Vec<Identity>,

    /// Source packages whose built packages are not traversed.
    pub excluded_sources: BTreeSet<String>,

    /// Source packages whose built packages provide nothing to traverse.
    pub excluded_built_by_source: BTreeSet<String>,

    /// Built packages that provide nothing to traverse.
    pub excluded_built: BTreeSet<String>,

    /// Built packages whose name starts with one of these provide nothing.
    pub terminal_prefixes: Vec<String>,

    /// Sources whose built packages are only needed at build time; source
    /// packages requiring their capabilities are not followed.
    pub build_only_sources: BTreeSet<String>,

    /// Capabilities whose requirers carry no signal.
    pub noise_capabilities: BTreeSet<String>,

    /// Parallel package family markers for subpackage suppression.
    pub family: FamilyMarkers,

    /// Nodes at or beyond this depth are recorded but not expanded by the
    /// primary pass.
    pub max_depth: Option<usize>,
}

/// Marker substrings of two parallel package families.
///
/// A built package whose name contains `current` is dropped when the same
/// name with `current` replaced by `legacy` is built by the same source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct FamilyMarkers {
    /// Marker of the family being migrated to.
    pub current: String,
    /// Marker of the legacy family.
    pub legacy: String,
}

/// Rules applied while rendering reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct ReportRules {
    /// Legacy roots: pinned to depth 0 and never expanded.
    pub pinned: Vec<Identity>,

    /// Identities starting with one of these (`TAG:name` form) are legacy
    /// markers too.
    pub legacy_identity_prefixes: Vec<String>,

    /// Names with this prefix are legacy when a parent is pinned.
    pub legacy_name_prefix: String,

    /// Maintainer name marking an orphaned package.
    pub orphan_marker: String,

    /// Maintainer shown for packages without ownership data.
    pub unknown_maintainer: String,
}

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(ToString::to_string).collect()
}

impl Default for DeptraceConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            builder: BuilderRules::default(),
            report: ReportRules::default(),
        }
    }
}

impl Default for BuilderRules {
    fn default() -> Self {
        Self {
            roots: vec![Identity::source("python27")],
            excluded_sources: names(&[
                // only need python2 to build their python2 subpackages
                "boost",
                "dbus-python",
                "protobuf",
                "qscintilla",
                // build-require python2 by mistake
                "lilv",
                "vtk",
            ]),
            excluded_built_by_source: names(&[
                "autodownloader",
                "bamf",
                "bamf-devel",
                "chromium",
                "dblatex",
                "gimp",
                "gimp-layer-via-copy-cut",
                "gimp-resynthesizer",
                "mercurial",
                "mlt",
                "postgresql",
                "pycairo",
                "pygobject2",
                "pygtk2",
                "pypy",
                "pypy3",
                "python-psutil",
                "qt5-qtwebengine",
                "texlive-base",
            ]),
            excluded_built: names(&["bzr"]),
            terminal_prefixes: vec!["python3-".to_string()],
            build_only_sources: names(&[
                "epydoc",
                "python-docutils",
                "python-nose",
                "python-pytest",
                "python2-setuptools",
                "python27",
            ]),
            noise_capabilities: names(&["font(:lang=en)"]),
            family: FamilyMarkers::default(),
            max_depth: None,
        }
    }
}

impl Default for FamilyMarkers {
    fn default() -> Self {
        Self {
            current: "python3".to_string(),
            legacy: "python2".to_string(),
        }
    }
}

impl Default for ReportRules {
    fn default() -> Self {
        Self {
            pinned: vec![
                Identity::source("python27"),
                Identity::built("python27"),
                Identity::capability("python(abi) = 2.7"),
            ],
            legacy_identity_prefixes: vec![
                "DEP:python2-devel =".to_string(),
                "DEP:python2 =".to_string(),
                "DEP:python2(x86_64) =".to_string(),
            ],
            legacy_name_prefix: "python2-".to_string(),
            orphan_marker: "orphan".to_string(),
            unknown_maintainer: "UNKNOWN".to_string(),
        }
    }
}

impl DeptraceConfig {
    /// Parse a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on invalid YAML or an unsupported version.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config = Self::from_yaml(&content)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load `path` if given, else [`CONFIG_FILE_NAME`] from the working
    /// directory if it exists, else the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a chosen file cannot be read or is invalid.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path).await;
        }
        let local = Path::new(CONFIG_FILE_NAME);
        if fs::try_exists(local).await? {
            Self::load(local).await
        } else {
            Ok(Self::default())
        }
    }

    /// Render as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))
    }

    fn validate(&self) -> Result<()> {
        if self.version != CONFIG_VERSION {
            return Err(Error::Config(format!(
                "unsupported config version {} (expected {CONFIG_VERSION})",
                self.version
            )));
        }
        if self.builder.family.current.is_empty() || self.builder.family.legacy.is_empty() {
            return Err(Error::Config("family markers must not be empty".to_string()));
        }
        Ok(())
    }
}
