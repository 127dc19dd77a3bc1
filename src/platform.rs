use std::fmt;
use crate::config::DistConfig;
use crate::error::{DistError, Result};

/// A platform for which a native binary package is published.
///
/// The set is closed: there is no wildcard or "closest match" fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    LinuxArm64,
    LinuxX64,
    DarwinArm64,
    DarwinX64,
    Win32Arm64,
    Win32X64,
}

impl Platform {
    /// Every supported platform, in publishing order.
    pub const ALL: [Platform; 6] = [
        Platform::LinuxArm64,
        Platform::LinuxX64,
        Platform::DarwinArm64,
        Platform::DarwinX64,
        Platform::Win32Arm64,
        Platform::Win32X64,
    ];

    /// OS name in the npm vocabulary (`process.platform`).
    pub fn os(self) -> &'static str {
        match self {
            Platform::LinuxArm64 | Platform::LinuxX64 => "linux",
            Platform::DarwinArm64 | Platform::DarwinX64 => "darwin",
            Platform::Win32Arm64 | Platform::Win32X64 => "win32",
        }
    }

    /// CPU architecture in the npm vocabulary (`process.arch`).
    pub fn arch(self) -> &'static str {
        match self {
            Platform::LinuxArm64 | Platform::DarwinArm64 | Platform::Win32Arm64 => "arm64",
            Platform::LinuxX64 | Platform::DarwinX64 | Platform::Win32X64 => "x64",
        }
    }

    /// Canonical platform name, e.g. `linux-x64`.
    pub fn name(self) -> &'static str {
        match self {
            Platform::LinuxArm64 => "linux-arm64",
            Platform::LinuxX64 => "linux-x64",
            Platform::DarwinArm64 => "darwin-arm64",
            Platform::DarwinX64 => "darwin-x64",
            Platform::Win32Arm64 => "win32-arm64",
            Platform::Win32X64 => "win32-x64",
        }
    }

    pub fn is_windows(self) -> bool {
        self.os() == "win32"
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a successful resolution: `{platformName, packageName}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlatform {
    pub platform: Platform,
    pub package_name: String,
}

/// The capability table consulted by every resolution path.
///
/// Install-time wrapper generation and run-time dispatch both go through
/// [`PlatformTable::full`]; restricted tables exist so that a narrower support
/// matrix can be expressed (and tested) without a second hand-written switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformTable {
    entries: Vec<Platform>,
}

impl PlatformTable {
    /// Table containing every platform in [`Platform::ALL`].
    pub fn full() -> PlatformTable {
        PlatformTable::new(Platform::ALL)
    }

    pub fn new<I: IntoIterator<Item = Platform>>(entries: I) -> PlatformTable {
        let mut table = PlatformTable { entries: Vec::new() };
        for platform in entries {
            if !table.entries.contains(&platform) {
                table.entries.push(platform);
            }
        }
        table
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.entries
    }

    /// Finds the platform for a raw (OS, architecture) pair in npm naming.
    ///
    /// # Errors
    /// Returns [`DistError::UnsupportedPlatform`] when the OS is unknown or the
    /// architecture is not supported on that OS.
    pub fn lookup(&self, os: &str, arch: &str) -> Result<Platform> {
        self.entries
            .iter()
            .copied()
            .find(|p| p.os() == os && p.arch() == arch)
            .ok_or_else(|| DistError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            })
    }

    /// Resolves a raw (OS, architecture) pair to its platform and package name.
    pub fn resolve(&self, os: &str, arch: &str, config: &DistConfig) -> Result<ResolvedPlatform> {
        let platform = self.lookup(os, arch)?;
        Ok(ResolvedPlatform {
            platform,
            package_name: config.platform_package(platform),
        })
    }
}

impl Default for PlatformTable {
    fn default() -> Self {
        PlatformTable::full()
    }
}

/// The (OS, architecture) pair of a host, in npm naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    pub os: String,
    pub arch: String,
}

impl HostPlatform {
    pub fn new(os: &str, arch: &str) -> HostPlatform {
        HostPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        }
    }

    /// Detects the host this binary was compiled for.
    pub fn detect() -> HostPlatform {
        HostPlatform::from_rust_names(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Translates Rust target names (`macos`, `aarch64`, ...) to npm names.
    /// Unknown values are kept as-is so errors name the real host.
    pub fn from_rust_names(os: &str, arch: &str) -> HostPlatform {
        let os = match os {
            "macos" => "darwin",
            "windows" => "win32",
            other => other,
        };
        let arch = match arch {
            "x86_64" => "x64",
            "aarch64" => "arm64",
            "x86" => "ia32",
            other => other,
        };
        HostPlatform::new(os, arch)
    }

    pub fn resolve(&self, table: &PlatformTable, config: &DistConfig) -> Result<ResolvedPlatform> {
        table.resolve(&self.os, &self.arch, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_matrix_resolves() {
        let config = DistConfig::default();
        let table = PlatformTable::full();
        let expected = [
            ("linux", "x64", "linux-x64", "@mocks-rs/mocks-linux-x64"),
            ("linux", "arm64", "linux-arm64", "@mocks-rs/mocks-linux-arm64"),
            ("darwin", "x64", "darwin-x64", "@mocks-rs/mocks-darwin-x64"),
            ("darwin", "arm64", "darwin-arm64", "@mocks-rs/mocks-darwin-arm64"),
            ("win32", "x64", "win32-x64", "@mocks-rs/mocks-win32-x64"),
            ("win32", "arm64", "win32-arm64", "@mocks-rs/mocks-win32-arm64"),
        ];
        for (os, arch, name, package) in expected {
            let resolved = table.resolve(os, arch, &config).unwrap();
            assert_eq!(resolved.platform.name(), name);
            assert_eq!(resolved.package_name, package);
        }
    }

    #[test]
    fn test_unknown_pairs_are_rejected() {
        let config = DistConfig::default();
        let table = PlatformTable::full();
        for (os, arch) in [
            ("freebsd", "x64"),
            ("linux", "ia32"),
            ("darwin", "ppc64"),
            ("win32", "ia32"),
            ("", ""),
            ("Linux", "x64"),
        ] {
            let err = table.resolve(os, arch, &config).unwrap_err();
            assert!(
                matches!(err, DistError::UnsupportedPlatform { .. }),
                "{os}/{arch} should be unsupported"
            );
        }
    }

    #[test]
    fn test_reduced_table_diverges_from_full_table() {
        let config = DistConfig::default();
        let reduced = PlatformTable::new([
            Platform::LinuxX64,
            Platform::DarwinX64,
            Platform::Win32X64,
        ]);
        assert!(matches!(
            reduced.resolve("linux", "arm64", &config),
            Err(DistError::UnsupportedPlatform { .. })
        ));
        assert!(PlatformTable::full().resolve("linux", "arm64", &config).is_ok());
    }

    #[test]
    fn test_new_drops_duplicates() {
        let table = PlatformTable::new([Platform::LinuxX64, Platform::LinuxX64]);
        assert_eq!(table.platforms(), &[Platform::LinuxX64]);
    }

    #[test]
    fn test_host_from_rust_names() {
        assert_eq!(HostPlatform::from_rust_names("macos", "aarch64"), HostPlatform::new("darwin", "arm64"));
        assert_eq!(HostPlatform::from_rust_names("windows", "x86_64"), HostPlatform::new("win32", "x64"));
        assert_eq!(HostPlatform::from_rust_names("linux", "riscv64"), HostPlatform::new("linux", "riscv64"));
    }
}
