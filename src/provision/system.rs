use anyhow::Result;
use log::debug;

use super::{ProvisionOptions, ProvisionOutcome, ResolvedPackageSet};
use crate::package::{
    PackageAction, PackageCatalog, PackageManager, VersionResolver, dev_package_name,
};
use crate::platform::Platform;

/// Everything needed to provision one runtime from system packages.
#[derive(Debug, Clone, Copy)]
pub struct SystemRequest<'a> {
    /// Runtime name, used in messages
    pub runtime: &'a str,
    /// Language version prefix ("" = any)
    pub version: &'a str,
    /// Possible package names, most specific first
    pub candidates: &'a [String],
    pub catalog: &'a PackageCatalog,
    pub options: &'a ProvisionOptions,
}

/// Installs, upgrades and removes a runtime through the native package manager.
pub struct SystemProvisioner<'a, P: PackageManager> {
    manager: &'a P,
    platform: &'a Platform,
}

impl<'a, P: PackageManager> SystemProvisioner<'a, P> {
    pub fn new(manager: &'a P, platform: &'a Platform) -> Self {
        Self { manager, platform }
    }

    /// Resolve the main and headers packages for a request.
    #[tracing::instrument(skip(self, request), fields(runtime = request.runtime, version = request.version))]
    pub fn resolve(&self, request: &SystemRequest<'_>) -> Result<ResolvedPackageSet> {
        let options = request.options;
        let package_name = match &options.package_name {
            Some(name) => name.clone(),
            None => {
                let known = request
                    .catalog
                    .package_names(self.platform)
                    .unwrap_or_default();
                VersionResolver::resolve(
                    request.runtime,
                    request.version,
                    self.platform,
                    request.candidates,
                    &known,
                )?
            }
        };
        let dev_package = dev_package_name(&package_name, self.platform.family, &options.dev_package);

        Ok(ResolvedPackageSet {
            package_name,
            dev_package,
            package_version: options.package_version.clone(),
        })
    }

    /// Install the runtime, or upgrade it when `package_upgrade` is set.
    #[tracing::instrument(skip(self, request), fields(runtime = request.runtime))]
    pub fn install(&self, request: &SystemRequest<'_>) -> Result<ProvisionOutcome> {
        let action = if request.options.package_upgrade {
            PackageAction::Upgrade
        } else {
            PackageAction::Install
        };
        let packages = self.resolve(request)?;
        self.run_package_action(&packages, request.version, action, true)
    }

    #[tracing::instrument(skip(self, request), fields(runtime = request.runtime))]
    pub fn upgrade(&self, request: &SystemRequest<'_>) -> Result<ProvisionOutcome> {
        let packages = self.resolve(request)?;
        self.run_package_action(&packages, request.version, PackageAction::Upgrade, true)
    }

    /// Remove the runtime. Purges on Debian-family platforms.
    #[tracing::instrument(skip(self, request), fields(runtime = request.runtime))]
    pub fn uninstall(&self, request: &SystemRequest<'_>) -> Result<ProvisionOutcome> {
        let packages = self.resolve(request)?;
        let action = self.platform.family.removal_action();
        self.run_package_action(&packages, request.version, action, false)
    }

    /// Run `action` for every package operation and aggregate the changed flag.
    ///
    /// With `check_version` and a non-empty `version`, each operation's
    /// candidate versions must start with `version` before it is applied.
    /// Operations already applied stay applied when a later one fails.
    pub fn run_package_action(
        &self,
        packages: &ResolvedPackageSet,
        version: &str,
        action: PackageAction,
        check_version: bool,
    ) -> Result<ProvisionOutcome> {
        debug!(
            "Building package operations using {:?}.",
            packages.packages()
        );
        let operations = packages.operations(self.platform.family, action);

        let mut outcome = ProvisionOutcome::default();
        for operation in &operations {
            if check_version && !version.is_empty() {
                let candidates = self.manager.candidate_versions(operation)?;
                let checked = operation.names.iter().enumerate().map(|(i, name)| {
                    (
                        name.as_str(),
                        candidates.get(i).and_then(|candidate| candidate.as_deref()),
                    )
                });
                VersionResolver::verify(checked, version)?;
            }

            debug!("Running {}", operation);
            let changed = self.manager.apply(operation)?;
            outcome = outcome.merge(changed);
        }

        Ok(outcome)
    }
}
