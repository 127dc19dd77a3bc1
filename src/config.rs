use std::path::{Path, PathBuf};
use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::error::{DistError, Result};
use crate::platform::Platform;

/// Name of the optional override file looked up in the repository root.
pub const CONFIG_FILE_NAME: &str = "npm-dist.toml";

/// Describes how the native binary is laid out across npm packages.
///
/// Every field has a default matching the `@mocks-rs/mocks` distribution, so an
/// `npm-dist.toml` only needs the keys it wants to change:
///
/// ```toml
/// scope = "@acme"
/// package = "tool"
/// binary = "tool"
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct DistConfig {
    /// npm scope of every published package, including the leading `@`.
    pub scope: String,
    /// Base package name. Platform packages are `<package>-<platform>`.
    pub package: String,
    /// File stem of the native executable.
    pub binary: String,
    /// Manifest holding the authoritative version, relative to the root.
    pub canonical_manifest: PathBuf,
    /// Directory containing the publishable npm packages.
    pub packages_dir: PathBuf,
    /// External changelog generator invoked during release preparation.
    pub changelog_tool: String,
    /// Branch the release pull request targets.
    pub base_branch: String,
    /// Location of the generated dispatcher, relative to the umbrella package.
    pub wrapper: PathBuf,
}

impl Default for DistConfig {
    fn default() -> Self {
        DistConfig {
            scope: String::from("@mocks-rs"),
            package: String::from("mocks"),
            binary: String::from("mocks"),
            canonical_manifest: PathBuf::from("Cargo.toml"),
            packages_dir: PathBuf::from("packages"),
            changelog_tool: String::from("git-cliff"),
            base_branch: String::from("main"),
            wrapper: PathBuf::from("bin").join("mocks.js"),
        }
    }
}

impl DistConfig {
    /// Loads `npm-dist.toml` from `root`, or returns the defaults when the file
    /// does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default<P: AsRef<Path>>(root: P) -> Result<DistConfig> {
        let path = root.as_ref().join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(DistConfig::default());
        }
        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|source| DistError::Config { path, source })
    }

    /// Full npm name of the umbrella package, e.g. `@mocks-rs/mocks`.
    pub fn umbrella_package(&self) -> String {
        format!("{}/{}", self.scope, self.package)
    }

    /// Full npm name of the package carrying the binary for `platform`,
    /// e.g. `@mocks-rs/mocks-linux-x64`.
    pub fn platform_package(&self, platform: Platform) -> String {
        format!("{}/{}-{}", self.scope, self.package, platform.name())
    }

    /// Executable file name for `platform` (`.exe` suffix on Windows).
    pub fn binary_file_name(&self, platform: Platform) -> String {
        if platform.is_windows() {
            format!("{}.exe", self.binary)
        } else {
            self.binary.clone()
        }
    }

    /// Directory of a package inside the packages tree, relative to the root.
    pub fn package_dir(&self, package_name: &str) -> PathBuf {
        package_name
            .split('/')
            .fold(self.packages_dir.clone(), |dir, part| dir.join(part))
    }

    /// Pattern matching dependency keys of the form `<scope>/<package>-<platform>`.
    pub fn platform_dependency_pattern(&self) -> Result<Regex> {
        let pattern = format!(
            r"^{}/{}-[^/]+$",
            regex::escape(&self.scope),
            regex::escape(&self.package)
        );
        Ok(Regex::new(&pattern)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_mocks_layout() {
        let config = DistConfig::default();
        assert_eq!(config.umbrella_package(), "@mocks-rs/mocks");
        assert_eq!(config.platform_package(Platform::DarwinArm64), "@mocks-rs/mocks-darwin-arm64");
        assert_eq!(
            config.package_dir("@mocks-rs/mocks-linux-x64"),
            PathBuf::from("packages").join("@mocks-rs").join("mocks-linux-x64")
        );
    }

    #[test]
    fn test_binary_file_name_has_exe_suffix_on_windows_only() {
        let config = DistConfig::default();
        assert_eq!(config.binary_file_name(Platform::Win32X64), "mocks.exe");
        assert_eq!(config.binary_file_name(Platform::Win32Arm64), "mocks.exe");
        assert_eq!(config.binary_file_name(Platform::LinuxX64), "mocks");
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempdir().unwrap();
        let config = DistConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config, DistConfig::default());
    }

    #[test]
    fn test_load_overrides_only_given_keys() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "scope = \"@acme\"\nchangelog-tool = \"cliff\"\n",
        )
        .unwrap();
        let config = DistConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.scope, "@acme");
        assert_eq!(config.changelog_tool, "cliff");
        assert_eq!(config.package, "mocks");
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "scope = [").unwrap();
        let err = DistConfig::load_or_default(dir.path()).unwrap_err();
        assert!(matches!(err, DistError::Config { .. }));
    }

    #[test]
    fn test_platform_dependency_pattern() {
        let pattern = DistConfig::default().platform_dependency_pattern().unwrap();
        assert!(pattern.is_match("@mocks-rs/mocks-linux-x64"));
        assert!(pattern.is_match("@mocks-rs/mocks-win32-arm64"));
        assert!(!pattern.is_match("@mocks-rs/mocks"));
        assert!(!pattern.is_match("@other/mocks-linux-x64"));
        assert!(!pattern.is_match("left-pad"));
    }
}
