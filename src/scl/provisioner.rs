use anyhow::Result;
use log::debug;
use std::fmt;

use super::SclPackage;
use crate::package::{PackageAction, PackageManager, PackageOperation, SourcePackageInstaller};
use crate::provision::ProvisionOutcome;

/// Package providing the `scl` command.
pub const SCL_UTILS_PACKAGE: &str = "scl-utils";

/// Name of the repository package registering a collection.
pub fn repository_package_name(collection: &str) -> String {
    format!("rhscl-{}", collection)
}

/// One step of a collection install or removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SclStep {
    /// Handled by the package manager.
    Package(PackageOperation),
    /// Package installed from a URL.
    Source {
        name: String,
        url: String,
        action: PackageAction,
    },
}

impl fmt::Display for SclStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SclStep::Package(operation) => write!(f, "{}", operation),
            SclStep::Source { name, url, action } => write!(f, "{} {} from {}", action, name, url),
        }
    }
}

impl SclPackage {
    /// The three steps for this collection, in execution order.
    ///
    /// Install upgrades scl-utils, installs the repository package, then the
    /// collection with a fresh metadata cache. Removal touches the same three
    /// packages in the same order.
    pub fn steps(&self, removal: bool) -> Vec<SclStep> {
        let (utils_action, action) = if removal {
            (PackageAction::Remove, PackageAction::Remove)
        } else {
            (PackageAction::Upgrade, PackageAction::Install)
        };

        vec![
            SclStep::Package(PackageOperation::single(SCL_UTILS_PACKAGE, None, utils_action)),
            SclStep::Source {
                name: repository_package_name(&self.name),
                url: self.url.clone(),
                action,
            },
            SclStep::Package(
                PackageOperation::single(self.name.clone(), None, action).flush_cache(!removal),
            ),
        ]
    }
}

/// Installs and removes software collections.
pub struct SclProvisioner<'a, P: PackageManager, S: SourcePackageInstaller> {
    manager: &'a P,
    installer: &'a S,
}

impl<'a, P: PackageManager, S: SourcePackageInstaller> SclProvisioner<'a, P, S> {
    pub fn new(manager: &'a P, installer: &'a S) -> Self {
        Self { manager, installer }
    }

    #[tracing::instrument(skip(self, package), fields(collection = %package.name))]
    pub fn install(&self, package: &SclPackage) -> Result<ProvisionOutcome> {
        self.run_steps(package.steps(false))
    }

    #[tracing::instrument(skip(self, package), fields(collection = %package.name))]
    pub fn uninstall(&self, package: &SclPackage) -> Result<ProvisionOutcome> {
        self.run_steps(package.steps(true))
    }

    /// Run steps in order, stopping at the first failure.
    fn run_steps(&self, steps: Vec<SclStep>) -> Result<ProvisionOutcome> {
        let mut outcome = ProvisionOutcome::default();
        for step in &steps {
            debug!("Running {}", step);
            let changed = match step {
                SclStep::Package(operation) => self.manager.apply(operation)?,
                SclStep::Source { name, url, action } => {
                    self.installer.apply_source(name, url, *action)?
                }
            };
            outcome = outcome.merge(changed);
        }
        Ok(outcome)
    }
}
