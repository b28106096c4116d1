//! Known package names per platform.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::platform::{Platform, PlatformTable};

/// Package names that exist for one runtime, per platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PackageCatalog {
    /// Used when the platform has no entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_package: Option<String>,
    #[serde(default)]
    pub packages: PlatformTable<Vec<String>>,
}

impl PackageCatalog {
    pub fn new(packages: PlatformTable<Vec<String>>) -> Self {
        Self {
            default_package: None,
            packages,
        }
    }

    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default_package = Some(name.into());
        self
    }

    /// All packages known to exist on `platform`.
    ///
    /// Falls back to the default package when the platform has no entry;
    /// `None` when there is neither.
    pub fn package_names(&self, platform: &Platform) -> Option<Vec<String>> {
        if let Some(names) = self.packages.value_for(platform) {
            return Some(names.clone());
        }
        let default = self.default_package.as_ref()?;
        debug!(
            "No known packages for {}, defaulting to '{}'.",
            platform, default
        );
        Some(vec![default.clone()])
    }
}
