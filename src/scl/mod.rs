//! Software collection (SCL) packages.
//!
//! A collection is installed from a vendor repository package plus the
//! collection package itself, and lives under its own prefix in `/opt/rh`.
//! Its `enable` script exports the environment needed to run it.

mod activation;
mod provisioner;

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ProvisionError;
use crate::platform::{Platform, PlatformTable};

pub use activation::{ActivationFileParser, EnvironmentMapping};
pub use provisioner::{SCL_UTILS_PACKAGE, SclProvisioner, SclStep, repository_package_name};

/// Root of all collection installs.
pub const SCL_ROOT: &str = "/opt/rh";

/// A registered collection package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SclPackageDescriptor {
    /// Full language version shipped by the collection, e.g. "3.5.1"
    pub version: String,
    /// Collection package name, e.g. "rh-python35"
    pub name: String,
    /// Repository package URL per platform
    #[serde(default)]
    pub urls: PlatformTable<String>,
}

impl SclPackageDescriptor {
    pub fn new(version: impl Into<String>, name: impl Into<String>, urls: PlatformTable<String>) -> Self {
        Self {
            version: version.into(),
            name: name.into(),
            urls,
        }
    }
}

/// A collection resolved for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SclPackage {
    pub version: String,
    pub name: String,
    /// Repository package URL for the platform
    pub url: String,
}

impl SclPackage {
    /// Install prefix of the collection.
    pub fn folder(&self) -> PathBuf {
        scl_folder(&self.name)
    }

    /// Activation script of the collection.
    pub fn enable_file(&self) -> PathBuf {
        enable_file(&self.name)
    }
}

/// `/opt/rh/<name>`
pub fn scl_folder(name: &str) -> PathBuf {
    PathBuf::from(SCL_ROOT).join(name)
}

/// `/opt/rh/<name>/enable`
pub fn enable_file(name: &str) -> PathBuf {
    scl_folder(name).join("enable")
}

/// Collection descriptors of one runtime, in registration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SclCatalog {
    descriptors: Vec<SclPackageDescriptor>,
}

impl SclCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor. Earlier registrations take precedence.
    pub fn register(&mut self, descriptor: SclPackageDescriptor) {
        self.descriptors.push(descriptor);
    }

    pub fn descriptors(&self) -> &[SclPackageDescriptor] {
        &self.descriptors
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// First descriptor whose version starts with `version`.
    pub fn find(&self, version: &str) -> Option<&SclPackageDescriptor> {
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.version.starts_with(version))
    }

    /// Resolve `version` to a collection for `platform`.
    ///
    /// Only the first matching descriptor is considered; when it has no URL
    /// for the platform, later descriptors are not tried.
    pub fn resolve(
        &self,
        runtime: &str,
        platform: &Platform,
        version: &str,
    ) -> Result<SclPackage, ProvisionError> {
        let package = self.find(version).and_then(|descriptor| {
            descriptor.urls.value_for(platform).map(|url| SclPackage {
                version: descriptor.version.clone(),
                name: descriptor.name.clone(),
                url: url.clone(),
            })
        });

        match package {
            Some(package) => {
                debug!(
                    "Resolved {} {:?} on {} to collection {} ({}).",
                    runtime, version, platform, package.name, package.url
                );
                Ok(package)
            }
            None => Err(ProvisionError::NoSclPackage {
                runtime: runtime.to_string(),
                version: version.to_string(),
                platform: platform.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PY33_URL: &str = "https://www.softwarecollections.org/en/scls/rhscl/python33/epel-7-x86_64/download/rhscl-python33-epel-7-x86_64.noarch.rpm";

    fn catalog() -> SclCatalog {
        let mut catalog = SclCatalog::new();
        catalog.register(SclPackageDescriptor::new(
            "3.4.2",
            "rh-python34",
            PlatformTable::new().with_version("rhel", "7", "https://example.com/rhscl-rh-python34.rpm".to_string()),
        ));
        catalog.register(SclPackageDescriptor::new(
            "3.3",
            "python33",
            PlatformTable::new()
                .with_version("rhel", "7", PY33_URL.to_string())
                .with_version("rhel", "6", "https://example.com/rhscl-python33-el6.rpm".to_string()),
        ));
        catalog
    }

    #[test]
    fn test_find_first_registered_match() {
        let catalog = catalog();
        assert_eq!(catalog.find("3").map(|d| d.name.as_str()), Some("rh-python34"));
        assert_eq!(catalog.find("3.3").map(|d| d.name.as_str()), Some("python33"));
        assert_eq!(catalog.find("").map(|d| d.name.as_str()), Some("rh-python34"));
        assert!(catalog.find("2.7").is_none());
    }

    #[test]
    fn test_resolve_registered_version_by_prefix() {
        let mut catalog = SclCatalog::new();
        catalog.register(SclPackageDescriptor::new(
            "3.3",
            "python33",
            PlatformTable::new().with_version("rhel", "7", PY33_URL.to_string()),
        ));

        let package = catalog
            .resolve("python", &Platform::new("centos", "7.4.1708"), "3")
            .unwrap();
        assert_eq!(
            package,
            SclPackage {
                version: "3.3".into(),
                name: "python33".into(),
                url: PY33_URL.into(),
            }
        );

        let err = catalog
            .resolve("python", &Platform::new("ubuntu", "16.04"), "3")
            .unwrap_err();
        assert_eq!(
            err,
            ProvisionError::NoSclPackage {
                runtime: "python".into(),
                version: "3".into(),
                platform: "ubuntu 16.04".into(),
            }
        );
    }

    #[test]
    fn test_resolve_does_not_fall_through_to_later_descriptors() {
        // rh-python34 matches "3" first but has no rhel 6 URL.
        let catalog = catalog();
        let platform = Platform::new("centos", "6.9");
        assert!(catalog.resolve("python", &platform, "3").is_err());

        assert_eq!(
            catalog.resolve("python", &platform, "3.3").unwrap().name,
            "python33"
        );
    }

    #[test]
    fn test_resolve_unknown_version() {
        let err = catalog()
            .resolve("python", &Platform::new("centos", "7"), "2.7")
            .unwrap_err();
        assert!(err.to_string().contains("No SCL repository package for python"));
    }

    #[test]
    fn test_collection_paths() {
        let package = catalog()
            .resolve("python", &Platform::new("rhel", "7"), "3.3")
            .unwrap();
        assert_eq!(package.folder(), PathBuf::from("/opt/rh/python33"));
        assert_eq!(package.enable_file(), PathBuf::from("/opt/rh/python33/enable"));
    }

    #[test]
    fn test_deserialize_catalog_keeps_order() {
        let json = r#"[
            {"version": "2.4.1", "name": "rh-ruby24", "urls": {"rhel": {"7": "https://a"}}},
            {"version": "2.3.1", "name": "rh-ruby23", "urls": {"rhel": "https://b"}}
        ]"#;
        let catalog: SclCatalog = serde_json::from_str(json).unwrap();
        let names: Vec<_> = catalog.descriptors().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["rh-ruby24", "rh-ruby23"]);
        assert_eq!(
            catalog
                .resolve("ruby", &Platform::new("centos", "6"), "2.3")
                .unwrap()
                .url,
            "https://b"
        );
    }
}
