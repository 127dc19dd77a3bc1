use std::path::{Path, PathBuf};
use serde::Deserialize;
use serde_json::{Map, Value};
use crate::config::DistConfig;
use crate::error::{DistError, Result};
use crate::platform::PlatformTable;

/// The sections of `Cargo.toml` that can carry the release version.
#[derive(Deserialize, Debug)]
struct CargoManifest {
    package: Option<PackageSection>,
    workspace: Option<WorkspaceSection>,
}

#[derive(Deserialize, Debug)]
struct PackageSection {
    /// Either a version string or `{ workspace = true }`.
    version: Option<toml::Value>,
}

#[derive(Deserialize, Debug)]
struct WorkspaceSection {
    package: Option<WorkspacePackage>,
}

#[derive(Deserialize, Debug)]
struct WorkspacePackage {
    version: Option<String>,
}

/// Reads the canonical version from the authoritative manifest.
///
/// The value is read fresh on every call; nothing is cached between runs.
#[derive(Debug, Clone)]
pub struct VersionSource {
    path: PathBuf,
}

impl VersionSource {
    pub fn new<P: AsRef<Path>>(path: P) -> VersionSource {
        VersionSource { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `package.version`, or `workspace.package.version` when the
    /// package inherits its version from the workspace.
    ///
    /// # Errors
    /// - [`DistError::ManifestRead`] if the file is unreadable or not TOML.
    /// - [`DistError::MissingVersion`] if no version is declared.
    /// - [`DistError::InvalidVersion`] if the version is not semver.
    pub fn read(&self) -> Result<String> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| DistError::read(&self.path, e))?;
        let manifest: CargoManifest = toml::from_str(&content)
            .map_err(|e| DistError::read(&self.path, e))?;

        let from_package = manifest
            .package
            .and_then(|p| p.version)
            .and_then(|v| v.as_str().map(str::to_string));
        let from_workspace = manifest
            .workspace
            .and_then(|w| w.package)
            .and_then(|p| p.version);
        let version = from_package
            .or(from_workspace)
            .ok_or_else(|| DistError::MissingVersion { path: self.path.clone() })?;

        semver::Version::parse(&version).map_err(|source| DistError::InvalidVersion {
            path: self.path.clone(),
            version: version.clone(),
            source,
        })?;
        Ok(version)
    }
}

/// A publishable npm `package.json`, kept as an order-preserving JSON object
/// so that rewriting it only touches the fields that change.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageManifest {
    fields: Map<String, Value>,
}

impl PackageManifest {
    pub fn parse(content: &str) -> std::result::Result<PackageManifest, serde_json::Error> {
        let fields: Map<String, Value> = serde_json::from_str(content)?;
        Ok(PackageManifest { fields })
    }

    /// Loads a manifest from disk.
    ///
    /// # Errors
    /// Returns [`DistError::ManifestRead`] on I/O or JSON errors.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<PackageManifest> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| DistError::read(path, e))?;
        PackageManifest::parse(&content).map_err(|e| DistError::read(path, e))
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.fields.get("version").and_then(Value::as_str)
    }

    pub fn set_version(&mut self, version: &str) {
        self.fields.insert("version".to_string(), Value::String(version.to_string()));
    }

    /// Entries of `optionalDependencies` whose value is a string.
    pub fn optional_dependencies(&self) -> Vec<(&str, &str)> {
        match self.fields.get("optionalDependencies") {
            Some(Value::Object(deps)) => deps
                .iter()
                .filter_map(|(name, v)| v.as_str().map(|v| (name.as_str(), v)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Entries of `optionalDependencies` whose key satisfies `matches`,
    /// whatever the type of their value.
    pub fn matching_dependencies<F>(&self, matches: F) -> Vec<(&str, &Value)>
    where
        F: Fn(&str) -> bool,
    {
        match self.fields.get("optionalDependencies") {
            Some(Value::Object(deps)) => deps
                .iter()
                .filter(|(name, _)| matches(name.as_str()))
                .map(|(name, value)| (name.as_str(), value))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Sets every entry from [`PackageManifest::matching_dependencies`] that
    /// is not already the string `version`. Returns the number of entries
    /// whose value changed.
    pub fn set_optional_dependencies<F>(&mut self, version: &str, matches: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let stale: Vec<String> = self
            .matching_dependencies(matches)
            .into_iter()
            .filter(|(_, value)| value.as_str() != Some(version))
            .map(|(name, _)| name.to_string())
            .collect();
        if let Some(Value::Object(deps)) = self.fields.get_mut("optionalDependencies") {
            for name in &stale {
                deps.insert(name.clone(), Value::String(version.to_string()));
            }
        }
        stale.len()
    }

    /// Two-space indented JSON with a trailing newline.
    pub fn to_pretty_string(&self) -> String {
        // Serializing a Map of Values cannot fail.
        let mut out = serde_json::to_string_pretty(&self.fields).unwrap_or_default();
        out.push('\n');
        out
    }
}

/// The fixed, ordered list of derived manifests: the umbrella package first,
/// then one per platform package in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSet {
    paths: Vec<PathBuf>,
}

impl ManifestSet {
    pub fn new(paths: Vec<PathBuf>) -> ManifestSet {
        ManifestSet { paths }
    }

    pub fn for_config<P: AsRef<Path>>(root: P, config: &DistConfig, table: &PlatformTable) -> ManifestSet {
        let root = root.as_ref();
        let mut paths = vec![root.join(config.package_dir(&config.umbrella_package())).join("package.json")];
        for platform in table.platforms() {
            let package = config.platform_package(*platform);
            paths.push(root.join(config.package_dir(&package)).join("package.json"));
        }
        ManifestSet { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
