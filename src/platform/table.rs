//! Values selected by platform name, platform family and platform version.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Platform;

/// Key used for the catch-all entry and the catch-all version.
pub const DEFAULT_KEY: &str = "default";

/// A table entry: either one value for every version, or values per version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlatformEntry<T> {
    Versioned(BTreeMap<String, T>),
    Any(T),
}

/// Map from platform keys to values.
///
/// Keys are platform names ("ubuntu"), family names ("rhel") or `default`.
/// One key may list several names separated by commas ("redhat,centos").
///
/// Lookup order:
/// 1. platform name
/// 2. platform family
/// 3. `default`
///
/// Within a versioned entry the exact version wins, then the longest key that
/// is a dotted prefix of the platform version, then `default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformTable<T> {
    entries: BTreeMap<String, PlatformEntry<T>>,
}

impl<T> Default for PlatformTable<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> PlatformTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value for every version of `key`.
    pub fn with(mut self, key: impl Into<String>, value: T) -> Self {
        self.entries.insert(key.into(), PlatformEntry::Any(value));
        self
    }

    /// Set the value for one version of `key`.
    ///
    /// Replaces an unversioned entry for the same key.
    pub fn with_version(mut self, key: impl Into<String>, version: impl Into<String>, value: T) -> Self {
        let entry = self
            .entries
            .entry(key.into())
            .or_insert_with(|| PlatformEntry::Versioned(BTreeMap::new()));
        if matches!(*entry, PlatformEntry::Any(_)) {
            *entry = PlatformEntry::Versioned(BTreeMap::new());
        }
        if let PlatformEntry::Versioned(versions) = entry {
            versions.insert(version.into(), value);
        }
        self
    }

    /// Select the value for a platform; `None` when nothing applies.
    pub fn value_for(&self, platform: &Platform) -> Option<&T> {
        self.lookup(&platform.name, &platform.version)
            .or_else(|| self.lookup(platform.family.as_str(), &platform.version))
            .or_else(|| self.lookup(DEFAULT_KEY, &platform.version))
    }

    fn lookup(&self, key: &str, version: &str) -> Option<&T> {
        let entry = self
            .entries
            .iter()
            .find(|(names, _)| names.split(',').any(|name| name.trim() == key))
            .map(|(_, entry)| entry)?;

        match entry {
            PlatformEntry::Any(value) => Some(value),
            PlatformEntry::Versioned(versions) => select_version(versions, version),
        }
    }
}

fn select_version<'a, T>(versions: &'a BTreeMap<String, T>, version: &str) -> Option<&'a T> {
    if let Some(value) = versions.get(version) {
        return Some(value);
    }

    versions
        .iter()
        .filter(|(key, _)| is_version_prefix(key, version))
        .max_by_key(|(key, _)| key.len())
        .map(|(_, value)| value)
        .or_else(|| versions.get(DEFAULT_KEY))
}

/// "7" matches "7.4.1708" but not "70".
fn is_version_prefix(key: &str, version: &str) -> bool {
    version
        .strip_prefix(key)
        .is_some_and(|rest| rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformFamily;

    fn ubuntu(version: &str) -> Platform {
        Platform::new("ubuntu", version)
    }

    #[test]
    fn test_lookup_by_platform_name() {
        let table = PlatformTable::new()
            .with("ubuntu", "from-name")
            .with("debian", "from-family");
        assert_eq!(table.value_for(&ubuntu("16.04")), Some(&"from-name"));
    }

    #[test]
    fn test_lookup_falls_back_to_family_then_default() {
        let table = PlatformTable::new()
            .with("debian", "from-family")
            .with("default", "fallback");
        assert_eq!(table.value_for(&ubuntu("16.04")), Some(&"from-family"));
        assert_eq!(
            table.value_for(&Platform::new("centos", "7")),
            Some(&"fallback")
        );
    }

    #[test]
    fn test_lookup_unknown_platform_is_none() {
        let table = PlatformTable::new().with("debian", 1);
        assert_eq!(table.value_for(&Platform::new("gentoo", "2.4")), None);
    }

    #[test]
    fn test_versioned_lookup() {
        let table = PlatformTable::new()
            .with_version("centos", "7", "seven")
            .with_version("centos", "6", "six")
            .with_version("centos", "default", "other");

        assert_eq!(table.value_for(&Platform::new("centos", "7")), Some(&"seven"));
        assert_eq!(
            table.value_for(&Platform::new("centos", "7.4.1708")),
            Some(&"seven")
        );
        assert_eq!(table.value_for(&Platform::new("centos", "6.9")), Some(&"six"));
        assert_eq!(table.value_for(&Platform::new("centos", "8")), Some(&"other"));
    }

    #[test]
    fn test_versioned_lookup_prefers_longest_prefix() {
        let table = PlatformTable::new()
            .with_version("ubuntu", "16", "sixteen")
            .with_version("ubuntu", "16.04", "xenial");
        assert_eq!(table.value_for(&ubuntu("16.04")), Some(&"xenial"));
        assert_eq!(table.value_for(&ubuntu("16.10")), Some(&"sixteen"));
        assert_eq!(table.value_for(&ubuntu("160")), None);
    }

    #[test]
    fn test_versioned_miss_falls_through_to_family() {
        let table = PlatformTable::new()
            .with_version("ubuntu", "14.04", "trusty")
            .with("debian", "family");
        assert_eq!(table.value_for(&ubuntu("18.04")), Some(&"family"));
    }

    #[test]
    fn test_comma_separated_keys() {
        let table = PlatformTable::new().with("redhat, centos", "el");
        assert_eq!(table.value_for(&Platform::new("centos", "7")), Some(&"el"));
        assert_eq!(table.value_for(&Platform::new("redhat", "7")), Some(&"el"));
        assert_eq!(table.value_for(&Platform::new("fedora", "28")), None);
    }

    #[test]
    fn test_explicit_family_is_used() {
        let table = PlatformTable::new().with("rhel", "el");
        let platform = Platform::with_family("cloudlinux", "7", PlatformFamily::Rhel);
        assert_eq!(table.value_for(&platform), Some(&"el"));
    }

    #[test]
    fn test_deserialize_mixed_entries() {
        let json = r#"{
            "ubuntu": {"16.04": ["python3.5"], "default": ["python3"]},
            "amazon": ["python27", "python36"]
        }"#;
        let table: PlatformTable<Vec<String>> = serde_json::from_str(json).unwrap();

        assert_eq!(
            table.value_for(&ubuntu("16.04")),
            Some(&vec!["python3.5".to_string()])
        );
        assert_eq!(
            table.value_for(&ubuntu("18.04")),
            Some(&vec!["python3".to_string()])
        );
        assert_eq!(
            table.value_for(&Platform::new("amzn", "2")),
            Some(&vec!["python27".to_string(), "python36".to_string()])
        );
    }
}
