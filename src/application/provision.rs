//! Provision use case - picks a provisioning kind and runs it.
//!
//! This use case coordinates:
//! - Runtime definition lookup
//! - System package vs software collection selection
//! - The system or collection provisioner
//! - Activation environment parsing for collections

use anyhow::{Result, bail};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::ProvisionPlan;
use crate::definition::{DefinitionRegistry, RuntimeDefinition};
use crate::package::{PackageAction, PackageManager, SourcePackageInstaller};
use crate::platform::Platform;
use crate::provision::{ProvisionOptions, ProvisionOutcome, SystemProvisioner, SystemRequest};
use crate::runtime::Runtime;
use crate::scl::{ActivationFileParser, EnvironmentMapping, SclPackage, SclProvisioner};

/// How a runtime is provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvisionKind {
    /// Native system packages
    System,
    /// Software collection
    #[serde(rename = "scl")]
    Collection,
}

impl fmt::Display for ProvisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionKind::System => write!(f, "system"),
            ProvisionKind::Collection => write!(f, "scl"),
        }
    }
}

impl FromStr for ProvisionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(ProvisionKind::System),
            "scl" | "collection" => Ok(ProvisionKind::Collection),
            _ => anyhow::bail!("Unknown provision kind: {}. Expected system or scl.", s),
        }
    }
}

/// One caller request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionRequest {
    /// Forced kind; chosen from the platform when unset
    pub kind: Option<ProvisionKind>,
    pub runtime: String,
    /// Language version prefix ("" = any)
    pub version: String,
    pub options: ProvisionOptions,
}

impl ProvisionRequest {
    pub fn new(runtime: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    pub fn kind(mut self, kind: ProvisionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn options(mut self, options: ProvisionOptions) -> Self {
        self.options = options;
        self
    }
}

/// Provision use case over injected host collaborators.
pub struct ProvisionUseCase<'a, R: Runtime, P: PackageManager, S: SourcePackageInstaller> {
    runtime: &'a R,
    manager: &'a P,
    installer: &'a S,
    registry: &'a DefinitionRegistry,
    platform: &'a Platform,
}

impl<'a, R, P, S> ProvisionUseCase<'a, R, P, S>
where
    R: Runtime,
    P: PackageManager,
    S: SourcePackageInstaller,
{
    pub fn new(
        runtime: &'a R,
        manager: &'a P,
        installer: &'a S,
        registry: &'a DefinitionRegistry,
        platform: &'a Platform,
    ) -> Self {
        Self {
            runtime,
            manager,
            installer,
            registry,
            platform,
        }
    }

    /// Kind to use for `request`.
    ///
    /// An explicit kind wins. Otherwise system packages are used where the
    /// platform family supports them, then a software collection when one
    /// resolves; anything else is a `NoSclPackage` error.
    pub fn select_kind(
        &self,
        request: &ProvisionRequest,
        definition: &RuntimeDefinition,
    ) -> Result<ProvisionKind> {
        if let Some(kind) = request.kind {
            return Ok(kind);
        }
        if self.platform.family.supports_system_packages() {
            return Ok(ProvisionKind::System);
        }
        definition
            .scl
            .resolve(&request.runtime, self.platform, &request.version)?;
        Ok(ProvisionKind::Collection)
    }

    fn collection(&self, request: &ProvisionRequest, definition: &RuntimeDefinition) -> Result<SclPackage> {
        Ok(definition
            .scl
            .resolve(&request.runtime, self.platform, &request.version)?)
    }

    fn system(&self) -> SystemProvisioner<'_, P> {
        SystemProvisioner::new(self.manager, self.platform)
    }

    /// Install the runtime.
    #[tracing::instrument(skip(self))]
    pub fn provision(&self, request: &ProvisionRequest) -> Result<ProvisionOutcome> {
        let definition = self.registry.get(&request.runtime)?;
        let kind = self.select_kind(request, definition)?;
        info!(
            "Provisioning {} {:?} on {} from {}",
            request.runtime, request.version, self.platform, kind
        );

        match kind {
            ProvisionKind::System => {
                let candidates = definition.candidate_names(&request.runtime, &request.version);
                self.system()
                    .install(&system_request(request, definition, &candidates))
            }
            ProvisionKind::Collection => {
                let package = self.collection(request, definition)?;
                SclProvisioner::new(self.manager, self.installer).install(&package)
            }
        }
    }

    /// Upgrade the runtime's system packages.
    #[tracing::instrument(skip(self))]
    pub fn upgrade(&self, request: &ProvisionRequest) -> Result<ProvisionOutcome> {
        let definition = self.registry.get(&request.runtime)?;
        if self.select_kind(request, definition)? != ProvisionKind::System {
            bail!(
                "Upgrade is only available for system packages; {} on {} uses a software collection",
                request.runtime,
                self.platform
            );
        }
        let candidates = definition.candidate_names(&request.runtime, &request.version);
        self.system()
            .upgrade(&system_request(request, definition, &candidates))
    }

    /// Remove the runtime.
    #[tracing::instrument(skip(self))]
    pub fn deprovision(&self, request: &ProvisionRequest) -> Result<ProvisionOutcome> {
        let definition = self.registry.get(&request.runtime)?;
        let kind = self.select_kind(request, definition)?;
        info!(
            "Removing {} {:?} on {} from {}",
            request.runtime, request.version, self.platform, kind
        );

        match kind {
            ProvisionKind::System => {
                let candidates = definition.candidate_names(&request.runtime, &request.version);
                self.system()
                    .uninstall(&system_request(request, definition, &candidates))
            }
            ProvisionKind::Collection => {
                let package = self.collection(request, definition)?;
                SclProvisioner::new(self.manager, self.installer).uninstall(&package)
            }
        }
    }

    /// Resolve what [`Self::provision`] would do, without changing anything.
    #[tracing::instrument(skip(self))]
    pub fn plan(&self, request: &ProvisionRequest) -> Result<ProvisionPlan> {
        let definition = self.registry.get(&request.runtime)?;
        let kind = self.select_kind(request, definition)?;

        let plan = match kind {
            ProvisionKind::System => {
                let candidates = definition.candidate_names(&request.runtime, &request.version);
                debug!("Candidate packages: {:?}", candidates);
                let packages = self
                    .system()
                    .resolve(&system_request(request, definition, &candidates))?;
                let action = if request.options.package_upgrade {
                    PackageAction::Upgrade
                } else {
                    PackageAction::Install
                };
                let operations = packages.operations(self.platform.family, action);
                ProvisionPlan::System {
                    platform: self.platform.clone(),
                    packages,
                    operations,
                }
            }
            ProvisionKind::Collection => {
                let package = self.collection(request, definition)?;
                let steps = package.steps(false);
                ProvisionPlan::Collection {
                    platform: self.platform.clone(),
                    package,
                    steps,
                }
            }
        };
        Ok(plan)
    }

    /// Environment exported by the collection providing `runtime` at `version`.
    #[tracing::instrument(skip(self))]
    pub fn activation_environment(&self, runtime: &str, version: &str) -> Result<EnvironmentMapping> {
        let definition = self.registry.get(runtime)?;
        let package = definition.scl.resolve(runtime, self.platform, version)?;
        self.activation_environment_at(&package.enable_file())
    }

    /// Environment exported by the activation script at `path`.
    pub fn activation_environment_at(&self, path: &Path) -> Result<EnvironmentMapping> {
        ActivationFileParser::new(self.runtime).parse(path)
    }
}

fn system_request<'r>(
    request: &'r ProvisionRequest,
    definition: &'r RuntimeDefinition,
    candidates: &'r [String],
) -> SystemRequest<'r> {
    SystemRequest {
        runtime: &request.runtime,
        version: &request.version,
        candidates,
        catalog: &definition.catalog,
        options: &request.options,
    }
}
