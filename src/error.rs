//! Domain errors raised while resolving and provisioning runtime packages.
//!
//! These are returned wrapped in `anyhow::Error` by the higher layers and can
//! be recovered with `downcast_ref::<ProvisionError>()`.

use thiserror::Error;

/// Errors that need an operator to fix the provisioning options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisionError {
    /// None of the candidate package names exists on this platform.
    #[error(
        "Unable to find a candidate package for {runtime} version {version:?} on {platform}. Please set the package_name option."
    )]
    NoCandidatePackage {
        runtime: String,
        version: String,
        platform: String,
    },

    /// The package manager would install a version outside the requested prefix.
    #[error(
        "Package {package} would install {candidate}, which does not match {requested}. Please set the package_name or package_version options."
    )]
    VersionMismatch {
        package: String,
        candidate: String,
        requested: String,
    },

    /// No software collection is registered for this version and platform.
    #[error("No SCL repository package for {runtime} version {version:?} on {platform}")]
    NoSclPackage {
        runtime: String,
        version: String,
        platform: String,
    },
}
