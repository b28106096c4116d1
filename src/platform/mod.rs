//! Platform identity and platform-specific package conventions.
//!
//! This module describes the host (platform name, version and packaging
//! family) and answers the per-family questions the provisioning layer asks:
//! header suffixes, how package operations must be grouped, which removal
//! action to use.

mod detection;
mod table;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::package::PackageAction;

pub use detection::{OsReleaseDetector, PlatformDetector, StaticDetector};
pub use table::{PlatformEntry, PlatformTable};

#[cfg(test)]
pub use detection::MockPlatformDetector;

/// Coarse packaging lineage of a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    Debian,
    Rhel,
    Fedora,
    Amazon,
    Arch,
    #[default]
    Other,
}

impl PlatformFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            PlatformFamily::Debian => "debian",
            PlatformFamily::Rhel => "rhel",
            PlatformFamily::Fedora => "fedora",
            PlatformFamily::Amazon => "amazon",
            PlatformFamily::Arch => "arch",
            PlatformFamily::Other => "other",
        }
    }

    /// Map a platform name (os-release `ID`) to its family.
    ///
    /// Returns `None` for names that are not known members of any family.
    pub fn from_platform_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "debian" | "ubuntu" | "linuxmint" | "raspbian" => Some(PlatformFamily::Debian),
            "rhel" | "redhat" | "centos" | "scientific" | "oracle" | "ol" | "rocky"
            | "almalinux" => Some(PlatformFamily::Rhel),
            "fedora" => Some(PlatformFamily::Fedora),
            "amzn" | "amazon" => Some(PlatformFamily::Amazon),
            "arch" | "archlinux" | "manjaro" => Some(PlatformFamily::Arch),
            _ => None,
        }
    }

    /// Suffix of the development headers package, if the family ships them separately.
    pub fn dev_suffix(self) -> Option<&'static str> {
        match self {
            PlatformFamily::Debian => Some("-dev"),
            PlatformFamily::Rhel | PlatformFamily::Fedora => Some("-devel"),
            _ => None,
        }
    }

    /// Whether each package needs its own operation.
    ///
    /// yum-based tooling cannot pin distinct versions for several names in one
    /// call, so those families get one operation per package.
    pub fn splits_package_operations(self) -> bool {
        matches!(
            self,
            PlatformFamily::Rhel | PlatformFamily::Fedora | PlatformFamily::Amazon
        )
    }

    /// Action used to uninstall packages on this family.
    pub fn removal_action(self) -> PackageAction {
        match self {
            PlatformFamily::Debian => PackageAction::Purge,
            _ => PackageAction::Remove,
        }
    }

    /// Whether runtimes can be provisioned from native system packages.
    pub fn supports_system_packages(self) -> bool {
        matches!(
            self,
            PlatformFamily::Debian
                | PlatformFamily::Rhel
                | PlatformFamily::Amazon
                | PlatformFamily::Fedora
        )
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformFamily {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debian" => Ok(PlatformFamily::Debian),
            "rhel" => Ok(PlatformFamily::Rhel),
            "fedora" => Ok(PlatformFamily::Fedora),
            "amazon" => Ok(PlatformFamily::Amazon),
            "arch" => Ok(PlatformFamily::Arch),
            "other" => Ok(PlatformFamily::Other),
            _ => anyhow::bail!(
                "Unknown platform family: {}. Expected debian, rhel, fedora, amazon, arch, or other.",
                s
            ),
        }
    }
}

/// Identity of the host platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Platform name, e.g. "ubuntu" or "centos"
    pub name: String,
    /// Platform version, e.g. "16.04" or "7"
    pub version: String,
    pub family: PlatformFamily,
}

impl Platform {
    /// Create a platform, deriving the family from its name.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        let family = PlatformFamily::from_platform_name(&name).unwrap_or_default();
        Self {
            name,
            version: version.into(),
            family,
        }
    }

    /// Create a platform with an explicit family.
    pub fn with_family(
        name: impl Into<String>,
        version: impl Into<String>,
        family: PlatformFamily,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            family,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    /// Parse `NAME/VERSION` (e.g. "ubuntu/16.04"); the version may be omitted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, version) = s.split_once('/').unwrap_or((s, ""));
        if name.is_empty() {
            anyhow::bail!("Invalid platform format. Expected 'name/version'.");
        }
        Ok(Platform::new(name.to_lowercase(), version))
    }
}
