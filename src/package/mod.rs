//! Package management module
//!
//! This module describes package operations and the package-manager
//! collaborators that carry them out, plus the pure pieces of package
//! resolution: the per-platform catalog of known package names, candidate
//! selection, and development-header naming.

mod catalog;
mod headers;
mod version;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use catalog::PackageCatalog;
pub use headers::{DevPackage, dev_package_name};
pub use version::VersionResolver;

/// Action requested from the package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageAction {
    Install,
    Upgrade,
    Remove,
    Purge,
}

impl PackageAction {
    pub fn is_removal(self) -> bool {
        matches!(self, PackageAction::Remove | PackageAction::Purge)
    }
}

impl fmt::Display for PackageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageAction::Install => write!(f, "install"),
            PackageAction::Upgrade => write!(f, "upgrade"),
            PackageAction::Remove => write!(f, "remove"),
            PackageAction::Purge => write!(f, "purge"),
        }
    }
}

/// One call into the package manager.
///
/// `names` and `versions` are parallel: `versions[i]` pins `names[i]`, `None`
/// meaning whatever the package manager picks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOperation {
    pub names: Vec<String>,
    pub versions: Vec<Option<String>>,
    pub action: PackageAction,
    /// Refresh the package manager's metadata cache before acting.
    pub flush_cache: bool,
}

impl PackageOperation {
    /// Operation on a single package.
    pub fn single(name: impl Into<String>, version: Option<String>, action: PackageAction) -> Self {
        Self {
            names: vec![name.into()],
            versions: vec![version],
            action,
            flush_cache: false,
        }
    }

    /// Operation on several packages at once.
    pub fn multi(packages: Vec<(String, Option<String>)>, action: PackageAction) -> Self {
        let (names, versions) = packages.into_iter().unzip();
        Self {
            names,
            versions,
            action,
            flush_cache: false,
        }
    }

    /// Request a metadata cache refresh before the action runs.
    pub fn flush_cache(mut self, flush: bool) -> Self {
        self.flush_cache = flush;
        self
    }

    /// Iterate `(name, pinned version)` pairs.
    pub fn packages(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.names
            .iter()
            .zip(&self.versions)
            .map(|(name, version)| (name.as_str(), version.as_deref()))
    }
}

impl fmt::Display for PackageOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let packages: Vec<String> = self
            .packages()
            .map(|(name, version)| match version {
                Some(version) => format!("{}={}", name, version),
                None => name.to_string(),
            })
            .collect();
        write!(f, "{} {}", self.action, packages.join(", "))?;
        if self.flush_cache {
            write!(f, " (flush cache)")?;
        }
        Ok(())
    }
}

/// The native package manager.
#[cfg_attr(test, mockall::automock)]
pub trait PackageManager: Send + Sync {
    /// Version the package manager would install for each package of the
    /// operation, in `names` order. `None` when nothing is installable.
    fn candidate_versions(&self, operation: &PackageOperation) -> Result<Vec<Option<String>>>;

    /// Carry out the operation. Returns whether anything changed.
    fn apply(&self, operation: &PackageOperation) -> Result<bool>;
}

/// Installs packages whose artifact is fetched from a URL (e.g. repository rpms).
#[cfg_attr(test, mockall::automock)]
pub trait SourcePackageInstaller: Send + Sync {
    /// Install or remove `name` using the artifact at `source`. Returns whether anything changed.
    fn apply_source(&self, name: &str, source: &str, action: PackageAction) -> Result<bool>;
}
