//! Runtime definitions: which packages and collections provide a runtime.
//!
//! Definitions are data. The built-in set ships inside the binary and can be
//! replaced by a JSON file of the same shape.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::package::PackageCatalog;
use crate::runtime::Runtime;
use crate::scl::SclCatalog;

const BUILTIN_DEFINITIONS: &str = include_str!("../../data/runtimes.json");

/// Everything known about one language runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RuntimeDefinition {
    /// Known language versions, most recent first
    #[serde(default)]
    pub versions: Vec<String>,
    /// Prefix of versioned package names; the runtime name when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_base: Option<String>,
    /// Packages per platform
    #[serde(flatten)]
    pub catalog: PackageCatalog,
    /// Software collections, in lookup order
    #[serde(default)]
    pub scl: SclCatalog,
}

impl RuntimeDefinition {
    /// Possible package names for `version`, most specific first.
    ///
    /// For every known version starting with `version`: `<base><ver>` and
    /// `<base><ver without dots>` ("python3.5", "python35"). Then `version`
    /// itself, the major version ("python3") or every known major when
    /// `version` is empty, and finally the bare base name.
    pub fn candidate_names(&self, runtime: &str, version: &str) -> Vec<String> {
        let base = self.package_base.as_deref().unwrap_or(runtime);
        let mut names: Vec<String> = Vec::new();
        let mut push = |name: String| {
            if !names.contains(&name) {
                names.push(name);
            }
        };

        for known in self.versions.iter().filter(|v| v.starts_with(version)) {
            push(format!("{}{}", base, known));
            push(format!("{}{}", base, known.replace('.', "")));
        }
        if !version.is_empty() {
            push(format!("{}{}", base, version));
            push(format!("{}{}", base, version.replace('.', "")));
        }

        let majors: Vec<&str> = if version.is_empty() {
            self.versions.iter().filter_map(|v| v.split('.').next()).collect()
        } else {
            version.split('.').next().into_iter().collect()
        };
        for major in majors {
            push(format!("{}{}", base, major));
        }
        push(base.to_string());

        names
    }
}

/// All runtime definitions by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct DefinitionRegistry {
    definitions: BTreeMap<String, RuntimeDefinition>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Definitions compiled into the binary (python, ruby).
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_DEFINITIONS).context("Failed to parse built-in runtime definitions")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let registry: Self = serde_json::from_str(json)?;
        Ok(registry)
    }

    /// Load definitions from `path`, or the built-in set when no path is given.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Self::builtin();
        };
        debug!("Loading runtime definitions from {}", path.display());
        let content = runtime.read_to_string(path)?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse runtime definitions in {}", path.display()))
    }

    /// Add or replace a definition.
    pub fn register(&mut self, name: impl Into<String>, definition: RuntimeDefinition) {
        self.definitions.insert(name.into(), definition);
    }

    pub fn get(&self, name: &str) -> Result<&RuntimeDefinition> {
        self.definitions.get(name).with_context(|| {
            format!(
                "No runtime definition registered for '{}'. Known runtimes: {}",
                name,
                self.names().collect::<Vec<_>>().join(", ")
            )
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }
}
