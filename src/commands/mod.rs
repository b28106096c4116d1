use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::{
    application::{ProvisionPlan, ProvisionRequest},
    platform::{OsReleaseDetector, Platform, StaticDetector},
    provision::ProvisionOutcome,
    runtime::Runtime,
    scl::{ActivationFileParser, EnvironmentMapping},
};

pub mod config;

use config::Config;

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Runtime definitions file; the built-in definitions when unset
    pub definitions: Option<PathBuf>,
    /// Platform override; read from os-release when unset
    pub platform: Option<Platform>,
}

fn load_config<'a, R: Runtime>(runtime: &'a R, settings: &Settings) -> Result<Config<'a, R>> {
    let definitions = settings.definitions.as_deref();
    match &settings.platform {
        Some(platform) => {
            debug!("Using platform override {}", platform);
            Config::new(runtime, definitions, &StaticDetector(platform.clone()))
        }
        None => Config::new(runtime, definitions, &OsReleaseDetector::new(runtime)),
    }
}

/// Install a runtime
#[tracing::instrument(skip(runtime, settings))]
pub fn install<R: Runtime>(runtime: &R, settings: &Settings, request: &ProvisionRequest) -> Result<()> {
    let config = load_config(runtime, settings)?;
    let outcome = config.use_case().provision(request)?;
    println!("{}", outcome_label(outcome));
    Ok(())
}

/// Upgrade a runtime's system packages
#[tracing::instrument(skip(runtime, settings))]
pub fn upgrade<R: Runtime>(runtime: &R, settings: &Settings, request: &ProvisionRequest) -> Result<()> {
    let config = load_config(runtime, settings)?;
    let outcome = config.use_case().upgrade(request)?;
    println!("{}", outcome_label(outcome));
    Ok(())
}

/// Remove a runtime
#[tracing::instrument(skip(runtime, settings))]
pub fn uninstall<R: Runtime>(runtime: &R, settings: &Settings, request: &ProvisionRequest) -> Result<()> {
    let config = load_config(runtime, settings)?;
    let outcome = config.use_case().deprovision(request)?;
    println!("{}", outcome_label(outcome));
    Ok(())
}

/// Show what `install` would do
#[tracing::instrument(skip(runtime, settings))]
pub fn plan<R: Runtime>(runtime: &R, settings: &Settings, request: &ProvisionRequest) -> Result<()> {
    let plan = resolve_plan(runtime, settings, request)?;
    debug!("Plan for {} has {} step(s)", request.runtime, plan.step_count());
    print!("{}", plan);
    Ok(())
}

fn resolve_plan<R: Runtime>(
    runtime: &R,
    settings: &Settings,
    request: &ProvisionRequest,
) -> Result<ProvisionPlan> {
    let config = load_config(runtime, settings)?;
    config.use_case().plan(request)
}

/// Print the environment a software collection exports.
///
/// With `path`, the activation script is read directly and neither the
/// platform nor the definitions are needed.
#[tracing::instrument(skip(runtime, settings))]
pub fn env<R: Runtime>(
    runtime: &R,
    settings: &Settings,
    name: &str,
    version: &str,
    path: Option<&Path>,
) -> Result<()> {
    let environment = activation_environment(runtime, settings, name, version, path)?;
    print!("{}", format_environment(&environment));
    Ok(())
}

fn activation_environment<R: Runtime>(
    runtime: &R,
    settings: &Settings,
    name: &str,
    version: &str,
    path: Option<&Path>,
) -> Result<EnvironmentMapping> {
    match path {
        Some(path) => ActivationFileParser::new(runtime).parse(path),
        None => {
            let config = load_config(runtime, settings)?;
            config.use_case().activation_environment(name, version)
        }
    }
}

fn outcome_label(outcome: ProvisionOutcome) -> &'static str {
    if outcome.changed { "changed" } else { "unchanged" }
}

fn format_environment(environment: &EnvironmentMapping) -> String {
    environment
        .iter()
        .map(|(name, value)| format!("{}={}\n", name, value))
        .collect()
}
