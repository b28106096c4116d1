use std::fmt;

use crate::package::PackageOperation;
use crate::platform::Platform;
use crate::provision::ResolvedPackageSet;
use crate::scl::{SclPackage, SclStep};

/// What a provisioning call would do, without doing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionPlan {
    System {
        platform: Platform,
        packages: ResolvedPackageSet,
        operations: Vec<PackageOperation>,
    },
    Collection {
        platform: Platform,
        package: SclPackage,
        steps: Vec<SclStep>,
    },
}

impl ProvisionPlan {
    /// Number of package manager calls the plan makes.
    pub fn step_count(&self) -> usize {
        match self {
            ProvisionPlan::System { operations, .. } => operations.len(),
            ProvisionPlan::Collection { steps, .. } => steps.len(),
        }
    }
}

impl fmt::Display for ProvisionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionPlan::System {
                platform,
                packages,
                operations,
            } => {
                writeln!(f, "platform: {} ({})", platform, platform.family)?;
                writeln!(f, "kind: system")?;
                writeln!(f, "package: {}", packages.package_name)?;
                writeln!(
                    f,
                    "dev package: {}",
                    packages.dev_package.as_deref().unwrap_or("none")
                )?;
                if let Some(version) = &packages.package_version {
                    writeln!(f, "package version: {}", version)?;
                }
                for operation in operations {
                    writeln!(f, "  {}", operation)?;
                }
            }
            ProvisionPlan::Collection {
                platform,
                package,
                steps,
            } => {
                writeln!(f, "platform: {} ({})", platform, platform.family)?;
                writeln!(f, "kind: scl")?;
                writeln!(f, "collection: {} {}", package.name, package.version)?;
                writeln!(f, "enable file: {}", package.enable_file().display())?;
                for step in steps {
                    writeln!(f, "  {}", step)?;
                }
            }
        }
        Ok(())
    }
}
