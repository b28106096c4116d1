//! Development header package naming.

use crate::platform::PlatformFamily;

/// Which development headers package to install alongside the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DevPackage {
    /// Derive the name from the runtime package and the platform family.
    #[default]
    Auto,
    /// Use this exact package name.
    Named(String),
    /// Do not install headers.
    Disabled,
}

/// Name of the headers package for `main_package`, or `None` when headers are skipped.
///
/// Families without a header convention (Arch, Amazon, ...) get no headers
/// package unless one is named explicitly.
pub fn dev_package_name(
    main_package: &str,
    family: PlatformFamily,
    setting: &DevPackage,
) -> Option<String> {
    match setting {
        DevPackage::Named(name) => Some(name.clone()),
        DevPackage::Disabled => None,
        DevPackage::Auto => family
            .dev_suffix()
            .map(|suffix| format!("{}{}", main_package, suffix)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_uses_family_suffix() {
        assert_eq!(
            dev_package_name("python3.5", PlatformFamily::Debian, &DevPackage::Auto),
            Some("python3.5-dev".to_string())
        );
        assert_eq!(
            dev_package_name("ruby", PlatformFamily::Rhel, &DevPackage::Auto),
            Some("ruby-devel".to_string())
        );
        assert_eq!(
            dev_package_name("python3", PlatformFamily::Fedora, &DevPackage::Auto),
            Some("python3-devel".to_string())
        );
    }

    #[test]
    fn test_auto_without_convention_skips_headers() {
        assert_eq!(
            dev_package_name("python27", PlatformFamily::Amazon, &DevPackage::Auto),
            None
        );
        assert_eq!(
            dev_package_name("python", PlatformFamily::Arch, &DevPackage::Auto),
            None
        );
    }

    #[test]
    fn test_explicit_name_and_disabled_ignore_platform() {
        let named = DevPackage::Named("libpython-dev".into());
        assert_eq!(
            dev_package_name("python", PlatformFamily::Arch, &named),
            Some("libpython-dev".to_string())
        );
        assert_eq!(
            dev_package_name("python", PlatformFamily::Debian, &DevPackage::Disabled),
            None
        );
    }
}
