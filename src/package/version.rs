//! Version resolution for runtime packages.
//!
//! Versions are plain string prefixes: "" matches everything, "2" matches
//! "2.7.12" and also "20.1". There is no semantic version comparison.

use crate::error::ProvisionError;
use crate::platform::Platform;

/// Version resolver - pure functions for package selection and verification.
pub struct VersionResolver;

impl VersionResolver {
    /// First candidate that is also a known package.
    ///
    /// Candidates must be ordered from most to least specific; the order of
    /// `known` does not matter.
    pub fn first_known<'a>(candidates: &'a [String], known: &[String]) -> Option<&'a str> {
        candidates
            .iter()
            .find(|name| known.contains(name))
            .map(String::as_str)
    }

    /// Pick the package for `runtime` at `version` on `platform`.
    pub fn resolve(
        runtime: &str,
        version: &str,
        platform: &Platform,
        candidates: &[String],
        known: &[String],
    ) -> Result<String, ProvisionError> {
        Self::first_known(candidates, known)
            .map(str::to_string)
            .ok_or_else(|| ProvisionError::NoCandidatePackage {
                runtime: runtime.to_string(),
                version: version.to_string(),
                platform: platform.to_string(),
            })
    }

    /// Literal prefix test of a package manager version against a language version.
    pub fn matches_prefix(candidate: &str, prefix: &str) -> bool {
        candidate.starts_with(prefix)
    }

    /// Check every candidate of an operation against the requested prefix.
    ///
    /// Fails on the first package whose candidate does not start with
    /// `prefix`. A missing candidate never matches.
    pub fn verify<'a>(
        packages: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
        prefix: &str,
    ) -> Result<(), ProvisionError> {
        for (package, candidate) in packages {
            match candidate {
                Some(candidate) if Self::matches_prefix(candidate, prefix) => {}
                _ => {
                    return Err(ProvisionError::VersionMismatch {
                        package: package.to_string(),
                        candidate: candidate.unwrap_or("nothing").to_string(),
                        requested: prefix.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
