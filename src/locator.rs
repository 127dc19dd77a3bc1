use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use crate::config::DistConfig;
use crate::error::{DistError, Result};
use crate::platform::{Platform, ResolvedPlatform};
use crate::util::is_executable;

/// Where a resolved binary was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarySource {
    /// Installed by the package manager as an optional dependency.
    OptionalDependency,
    /// Shipped next to the umbrella package (manual or degraded installs).
    Fallback,
}

/// A reference to the native binary of one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryReference {
    Unresolved { platform: Platform },
    Resolved { path: PathBuf, source: BinarySource },
}

impl BinaryReference {
    pub fn path(&self) -> Option<&Path> {
        match self {
            BinaryReference::Resolved { path, .. } => Some(path),
            BinaryReference::Unresolved { .. } => None,
        }
    }
}

/// Finds the native executable of a platform below an umbrella package root.
///
/// Layout:
/// - `<root>/node_modules/<scope>/<package>-<platform>/<binary>` (preferred)
/// - `<root>/bin/<binary>` (fallback)
#[derive(Debug, Clone)]
pub struct BinaryLocator<'a> {
    package_root: PathBuf,
    config: &'a DistConfig,
}

impl<'a> BinaryLocator<'a> {
    pub fn new<P: AsRef<Path>>(package_root: P, config: &'a DistConfig) -> BinaryLocator<'a> {
        BinaryLocator {
            package_root: package_root.as_ref().to_path_buf(),
            config,
        }
    }

    /// Candidate paths for `resolved`, in lookup order.
    pub fn candidates(&self, resolved: &ResolvedPlatform) -> [(PathBuf, BinarySource); 2] {
        let file_name = self.config.binary_file_name(resolved.platform);
        let dependency_dir = resolved
            .package_name
            .split('/')
            .fold(self.package_root.join("node_modules"), |dir, part| dir.join(part));
        [
            (dependency_dir.join(&file_name), BinarySource::OptionalDependency),
            (self.package_root.join("bin").join(&file_name), BinarySource::Fallback),
        ]
    }

    /// Returns the reference without failing when nothing is installed.
    pub fn lookup(&self, resolved: &ResolvedPlatform) -> BinaryReference {
        for (path, source) in self.candidates(resolved) {
            if path.is_file() {
                debug!("found {} binary at {}", resolved.platform, path.display());
                if !is_executable(&path) {
                    warn!("{} is not marked executable", path.display());
                }
                return BinaryReference::Resolved { path, source };
            }
            debug!("no binary at {}", path.display());
        }
        BinaryReference::Unresolved { platform: resolved.platform }
    }

    /// Locates the binary for `resolved`.
    ///
    /// # Errors
    /// Returns [`DistError::BinaryNotFound`] naming the platform package to
    /// install when no candidate exists.
    pub fn locate(&self, resolved: &ResolvedPlatform) -> Result<PathBuf> {
        match self.lookup(resolved) {
            BinaryReference::Resolved { path, .. } => Ok(path),
            BinaryReference::Unresolved { platform } => Err(DistError::BinaryNotFound {
                platform: platform.name().to_string(),
                package: resolved.package_name.clone(),
                searched: self.candidates(resolved).into_iter().map(|(p, _)| p).collect(),
            }),
        }
    }
}
