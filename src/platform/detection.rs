use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

use super::{Platform, PlatformFamily};
use crate::runtime::Runtime;

/// Default location of the os-release file.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Trait for platform detection (useful for testing)
#[cfg_attr(test, mockall::automock)]
pub trait PlatformDetector: Send + Sync {
    fn detect(&self) -> Result<Platform>;
}

/// Detects the platform from an os-release file.
pub struct OsReleaseDetector<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
}

impl<'a, R: Runtime> OsReleaseDetector<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self::with_path(runtime, OS_RELEASE_PATH)
    }

    pub fn with_path(runtime: &'a R, path: impl AsRef<Path>) -> Self {
        Self {
            runtime,
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl<R: Runtime> PlatformDetector for OsReleaseDetector<'_, R> {
    #[tracing::instrument(skip(self))]
    fn detect(&self) -> Result<Platform> {
        let content = self
            .runtime
            .read_to_string(&self.path)
            .with_context(|| {
                format!(
                    "Failed to detect platform from {}. Use --platform to set it explicitly.",
                    self.path.display()
                )
            })?;
        let platform = parse_os_release(&content)?;
        debug!("Detected platform {} ({})", platform, platform.family);
        Ok(platform)
    }
}

/// Always reports the same platform; used for explicit overrides.
pub struct StaticDetector(pub Platform);

impl PlatformDetector for StaticDetector {
    fn detect(&self) -> Result<Platform> {
        Ok(self.0.clone())
    }
}

fn parse_os_release(content: &str) -> Result<Platform> {
    let mut id = None;
    let mut version = String::new();
    let mut id_like = String::new();

    for line in content.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        match key {
            "ID" => id = Some(value.to_lowercase()),
            "VERSION_ID" => version = value.to_string(),
            "ID_LIKE" => id_like = value.to_lowercase(),
            _ => {}
        }
    }

    let name = id.context("os-release does not define ID")?;
    let family = PlatformFamily::from_platform_name(&name)
        .or_else(|| {
            id_like
                .split_whitespace()
                .find_map(PlatformFamily::from_platform_name)
        })
        .unwrap_or_default();

    Ok(Platform::with_family(name, version, family))
}
