//! Package manager backed by the host's native tools.
//!
//! Every query and change runs through [`Runtime::run_command`], so the whole
//! backend can be exercised against a mocked runtime.

mod commands;

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};

use crate::package::{PackageAction, PackageManager, PackageOperation, SourcePackageInstaller};
use crate::platform::PlatformFamily;
use crate::runtime::{CommandOutput, Runtime};

pub use commands::{
    action_command, candidate_version_command, flush_cache_command, installed_version_command,
    package_spec, parse_candidate_version, parse_installed_version,
};

/// Drives dpkg/apt, rpm/yum/dnf or pacman depending on the platform family.
pub struct CommandPackageManager<'a, R: Runtime> {
    runtime: &'a R,
    family: PlatformFamily,
}

impl<'a, R: Runtime> CommandPackageManager<'a, R> {
    pub fn new(runtime: &'a R, family: PlatformFamily) -> Self {
        Self { runtime, family }
    }

    fn run(&self, command: &[String]) -> Result<CommandOutput> {
        let (program, args) = command
            .split_first()
            .context("Cannot run an empty command")?;
        self.runtime.run_command(program, args)
    }

    /// Run a command that changes the system; a failure status is an error.
    fn run_change(&self, command: &[String]) -> Result<()> {
        if !self.runtime.is_privileged() {
            warn!(
                "Running '{}' without root privileges; it will probably fail.",
                command.join(" ")
            );
        }
        info!("Running {}", command.join(" "));
        let output = self.run(command)?;
        if !output.success {
            bail!(
                "Command '{}' failed: {}",
                command.join(" "),
                output.stderr.trim()
            );
        }
        Ok(())
    }

    pub fn installed_version(&self, name: &str) -> Result<Option<String>> {
        let command = installed_version_command(self.family, name)?;
        let output = self.run(&command)?;
        if !output.success {
            return Ok(None);
        }
        Ok(parse_installed_version(self.family, &output.stdout))
    }

    pub fn candidate_version(&self, name: &str) -> Result<Option<String>> {
        let command = candidate_version_command(self.family, name)?;
        let output = self.run(&command)?;
        if !output.success {
            return Ok(None);
        }
        Ok(parse_candidate_version(self.family, &output.stdout))
    }

    /// Whether `action` would change `name`.
    fn needs_change(&self, name: &str, pin: Option<&str>, action: PackageAction) -> Result<bool> {
        let installed = self.installed_version(name)?;
        let needed = match (action, installed.as_deref()) {
            (PackageAction::Remove | PackageAction::Purge, installed) => installed.is_some(),
            (_, None) => true,
            (_, Some(installed)) if pin.is_some() => pin != Some(installed),
            (PackageAction::Install, Some(_)) => false,
            (PackageAction::Upgrade, Some(installed)) => self
                .candidate_version(name)?
                .is_some_and(|candidate| candidate != installed),
        };
        debug!(
            "{} {}: installed {:?}, change needed: {}",
            action, name, installed, needed
        );
        Ok(needed)
    }
}

impl<R: Runtime> PackageManager for CommandPackageManager<'_, R> {
    #[tracing::instrument(skip(self), fields(names = ?operation.names))]
    fn candidate_versions(&self, operation: &PackageOperation) -> Result<Vec<Option<String>>> {
        operation
            .packages()
            .map(|(name, pin)| match pin {
                // The package manager installs exactly the pin or fails.
                Some(pin) => Ok(Some(pin.to_string())),
                None => self.candidate_version(name),
            })
            .collect()
    }

    #[tracing::instrument(skip(self), fields(action = %operation.action, names = ?operation.names))]
    fn apply(&self, operation: &PackageOperation) -> Result<bool> {
        let action = operation.action;
        if operation.flush_cache && !action.is_removal() {
            self.run_change(&flush_cache_command(self.family)?)?;
        }

        let mut pending = Vec::new();
        for (name, pin) in operation.packages() {
            if self.needs_change(name, pin, action)? {
                pending.push((name, pin));
            }
        }
        if pending.is_empty() {
            debug!("Nothing to do for {}", operation);
            return Ok(false);
        }

        self.run_change(&action_command(self.family, action, &pending)?)?;
        Ok(true)
    }
}

impl<R: Runtime> SourcePackageInstaller for CommandPackageManager<'_, R> {
    #[tracing::instrument(skip(self))]
    fn apply_source(&self, name: &str, source: &str, action: PackageAction) -> Result<bool> {
        let installed = self.run(&commands::source_query_command(name))?.success;
        if action.is_removal() {
            if !installed {
                return Ok(false);
            }
            self.run_change(&commands::source_remove_command(name))?;
        } else {
            if installed {
                return Ok(false);
            }
            self.run_change(&commands::source_install_command(source))?;
        }
        Ok(true)
    }
}
