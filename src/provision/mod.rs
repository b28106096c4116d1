//! Provisioning of language runtimes from native system packages.
//!
//! The flow for one call is:
//! 1. resolve the main and headers package names ([`ResolvedPackageSet`])
//! 2. group them into package operations according to the platform family
//! 3. for each operation, verify candidate versions, then apply it
//! 4. report whether any operation changed something

mod system;

use crate::package::{DevPackage, PackageAction, PackageOperation};
use crate::platform::PlatformFamily;

pub use system::{SystemProvisioner, SystemRequest};

/// Caller overrides for system package provisioning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionOptions {
    /// Main package name; resolved from the catalog when unset
    pub package_name: Option<String>,
    /// Development headers package
    pub dev_package: DevPackage,
    /// Package manager version pin, distinct from the language version
    pub package_version: Option<String>,
    /// Use the upgrade action instead of install
    pub package_upgrade: bool,
}

/// Packages resolved for one provisioning call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackageSet {
    pub package_name: String,
    pub dev_package: Option<String>,
    pub package_version: Option<String>,
}

impl ResolvedPackageSet {
    /// `(name, pin)` pairs, main package first. Headers share the main pin.
    pub fn packages(&self) -> Vec<(String, Option<String>)> {
        let mut packages = vec![(self.package_name.clone(), self.package_version.clone())];
        if let Some(dev) = &self.dev_package
            && dev != &self.package_name
        {
            packages.push((dev.clone(), self.package_version.clone()));
        }
        packages
    }

    /// Package operations for `action` on a platform family.
    ///
    /// Families whose tooling cannot pin several packages in one call get one
    /// operation per package; everything else gets a single operation.
    pub fn operations(&self, family: PlatformFamily, action: PackageAction) -> Vec<PackageOperation> {
        let packages = self.packages();
        if family.splits_package_operations() {
            packages
                .into_iter()
                .map(|(name, version)| PackageOperation::single(name, version, action))
                .collect()
        } else {
            vec![PackageOperation::multi(packages, action)]
        }
    }
}

/// Result of a provisioning call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProvisionOutcome {
    pub changed: bool,
}

impl ProvisionOutcome {
    pub fn changed(changed: bool) -> Self {
        Self { changed }
    }

    /// Fold in the result of one more step.
    pub fn merge(self, changed: bool) -> Self {
        Self {
            changed: self.changed || changed,
        }
    }
}
