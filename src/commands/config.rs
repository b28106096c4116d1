use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::{
    application::ProvisionUseCase,
    backend::CommandPackageManager,
    definition::DefinitionRegistry,
    platform::{Platform, PlatformDetector},
    runtime::Runtime,
};

/// Collaborators shared by every provisioning command.
pub struct Config<'a, R: Runtime> {
    pub runtime: &'a R,
    pub registry: DefinitionRegistry,
    pub platform: Platform,
    pub manager: CommandPackageManager<'a, R>,
}

impl<'a, R: Runtime> Config<'a, R> {
    pub fn new(
        runtime: &'a R,
        definitions: Option<&Path>,
        detector: &dyn PlatformDetector,
    ) -> Result<Self> {
        let registry = DefinitionRegistry::load(runtime, definitions)?;
        let platform = detector.detect()?;
        debug!(
            "Using platform {} ({}) with runtimes: {}",
            platform,
            platform.family,
            registry.names().collect::<Vec<_>>().join(", ")
        );

        Ok(Self {
            runtime,
            registry,
            manager: CommandPackageManager::new(runtime, platform.family),
            platform,
        })
    }

    /// Use case backed by the native package manager, which also installs repository rpms.
    pub fn use_case(
        &self,
    ) -> ProvisionUseCase<'_, R, CommandPackageManager<'a, R>, CommandPackageManager<'a, R>> {
        ProvisionUseCase::new(
            self.runtime,
            &self.manager,
            &self.manager,
            &self.registry,
            &self.platform,
        )
    }
}
