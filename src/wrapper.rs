use std::path::{Path, PathBuf};
use tracing::info;
use crate::config::DistConfig;
use crate::error::{DistError, Result};
use crate::locator::BinaryLocator;
use crate::platform::{HostPlatform, PlatformTable, ResolvedPlatform};
use crate::util::write_atomic;

/// Flavour of the generated dispatcher script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum WrapperStyle {
    /// Node script referenced by the npm `bin` entry.
    #[default]
    Node,
    /// POSIX shell script that `exec`s the binary.
    Shell,
    /// Windows batch file.
    Batch,
}

impl WrapperStyle {
    /// Location of the wrapper for this style, derived from the configured
    /// Node wrapper path.
    pub fn wrapper_path(self, configured: &Path) -> PathBuf {
        match self {
            WrapperStyle::Node => configured.to_path_buf(),
            WrapperStyle::Shell => configured.with_extension("sh"),
            WrapperStyle::Batch => configured.with_extension("cmd"),
        }
    }

    /// Renders the wrapper text with `binary` embedded literally.
    ///
    /// # Errors
    /// Returns [`DistError::UnquotablePath`] for a batch wrapper whose path
    /// contains `"`, which `cmd` cannot quote.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use mocks_dist::WrapperStyle;
    ///
    /// let script = WrapperStyle::Shell.render(Path::new("/opt/mocks"), "mocks").unwrap();
    /// assert!(script.contains("exec '/opt/mocks' \"$@\""));
    /// ```
    pub fn render(self, binary: &Path, name: &str) -> Result<String> {
        let path = binary;
        let binary = binary.to_string_lossy();
        let script = match self {
            WrapperStyle::Node => {
                // serde_json string escaping matches JSON.stringify for paths
                let literal = serde_json::Value::String(binary.to_string()).to_string();
                let name = serde_json::Value::String(name.to_string()).to_string();
                format!(
                    r#"#!/usr/bin/env node

const {{ spawn }} = require('child_process');

const binaryPath = {literal};
const args = process.argv.slice(2);

const child = spawn(binaryPath, args, {{
  stdio: 'inherit',
  windowsHide: false
}});

child.on('close', (code, signal) => {{
  if (signal) {{
    process.kill(process.pid, signal);
    return;
  }}
  process.exit(code);
}});

child.on('error', (err) => {{
  console.error('Failed to start ' + {name} + ':', err.message);
  process.exit(1);
}});
"#
                )
            }
            WrapperStyle::Shell => {
                let quoted = binary.replace('\'', r"'\''");
                format!("#!/bin/sh\nexec '{quoted}' \"$@\"\n")
            }
            WrapperStyle::Batch => {
                if binary.contains('"') {
                    return Err(DistError::UnquotablePath {
                        path: path.to_path_buf(),
                        style: "batch".to_string(),
                    });
                }
                let escaped = binary.replace('%', "%%");
                format!("@echo off\r\n\"{escaped}\" %*\r\nexit /b %ERRORLEVEL%\r\n")
            }
        };
        Ok(script)
    }
}

/// Outcome of a wrapper generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedWrapper {
    pub wrapper: PathBuf,
    pub binary: PathBuf,
    pub resolved: ResolvedPlatform,
}

/// Install-time step: resolves the host binary once and writes a dispatcher
/// script pointing at it.
#[derive(Debug, Clone)]
pub struct WrapperGenerator<'a> {
    package_root: PathBuf,
    config: &'a DistConfig,
    table: &'a PlatformTable,
    host: HostPlatform,
}

impl<'a> WrapperGenerator<'a> {
    pub fn new<P: AsRef<Path>>(
        package_root: P,
        config: &'a DistConfig,
        table: &'a PlatformTable,
        host: HostPlatform,
    ) -> WrapperGenerator<'a> {
        WrapperGenerator {
            package_root: package_root.as_ref().to_path_buf(),
            config,
            table,
            host,
        }
    }

    /// Resolves the binary and (over)writes the wrapper.
    ///
    /// # Errors
    /// Fails with [`crate::DistError::UnsupportedPlatform`] or
    /// [`crate::DistError::BinaryNotFound`] before anything is written, or with an I/O
    /// error if the wrapper cannot be written.
    pub fn generate(&self, style: WrapperStyle) -> Result<GeneratedWrapper> {
        let resolved = self.host.resolve(self.table, self.config)?;
        let binary = BinaryLocator::new(&self.package_root, self.config).locate(&resolved)?;
        let binary = std::path::absolute(&binary)?;

        let wrapper = self
            .package_root
            .join(style.wrapper_path(&self.config.wrapper));
        if let Some(dir) = wrapper.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let script = style.render(&binary, &self.config.binary)?;
        let mode = if resolved.platform.is_windows() { None } else { Some(0o755) };
        write_atomic(&wrapper, script.as_bytes(), mode)?;
        info!("wrote {} wrapper for {}", wrapper.display(), resolved.platform);

        Ok(GeneratedWrapper { wrapper, binary, resolved })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn install_binary(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"binary").unwrap();
        path
    }

    #[test]
    fn test_generates_node_wrapper_with_embedded_path() {
        let dir = tempdir().unwrap();
        let config = DistConfig::default();
        let table = PlatformTable::full();
        let binary = install_binary(dir.path(), "node_modules/@mocks-rs/mocks-linux-x64/mocks");

        let generator = WrapperGenerator::new(dir.path(), &config, &table, HostPlatform::new("linux", "x64"));
        let generated = generator.generate(WrapperStyle::Node).unwrap();

        assert_eq!(generated.wrapper, dir.path().join("bin").join("mocks.js"));
        let script = std::fs::read_to_string(&generated.wrapper).unwrap();
        assert!(script.starts_with("#!/usr/bin/env node"));
        let literal = serde_json::Value::String(binary.to_string_lossy().to_string()).to_string();
        assert!(script.contains(&format!("const binaryPath = {literal};")));
        assert!(script.contains("stdio: 'inherit'"));
    }

    #[cfg(unix)]
    #[test]
    fn test_wrapper_is_executable_for_unix_targets() {
        let dir = tempdir().unwrap();
        let config = DistConfig::default();
        let table = PlatformTable::full();
        install_binary(dir.path(), "node_modules/@mocks-rs/mocks-darwin-arm64/mocks");

        let generator = WrapperGenerator::new(dir.path(), &config, &table, HostPlatform::new("darwin", "arm64"));
        let generated = generator.generate(WrapperStyle::Node).unwrap();
        assert!(crate::util::is_executable(&generated.wrapper));
    }

    #[test]
    fn test_regeneration_overwrites() {
        let dir = tempdir().unwrap();
        let config = DistConfig::default();
        let table = PlatformTable::full();
        install_binary(dir.path(), "bin/mocks");
        std::fs::write(dir.path().join("bin/mocks.js"), "stale").unwrap();

        let generator = WrapperGenerator::new(dir.path(), &config, &table, HostPlatform::new("linux", "arm64"));
        let first = generator.generate(WrapperStyle::Node).unwrap();
        let first_script = std::fs::read_to_string(&first.wrapper).unwrap();
        let second = generator.generate(WrapperStyle::Node).unwrap();
        assert_eq!(first_script, std::fs::read_to_string(&second.wrapper).unwrap());
        assert!(!first_script.contains("stale"));
    }

    #[test]
    fn test_missing_binary_writes_nothing() {
        let dir = tempdir().unwrap();
        let config = DistConfig::default();
        let table = PlatformTable::full();

        let generator = WrapperGenerator::new(dir.path(), &config, &table, HostPlatform::new("linux", "x64"));
        let err = generator.generate(WrapperStyle::Node).unwrap_err();
        assert!(matches!(err, DistError::BinaryNotFound { .. }));
        assert!(!dir.path().join("bin").exists());
    }

    #[test]
    fn test_unsupported_host_writes_nothing() {
        let dir = tempdir().unwrap();
        let config = DistConfig::default();
        let table = PlatformTable::full();
        install_binary(dir.path(), "bin/mocks");

        let generator = WrapperGenerator::new(dir.path(), &config, &table, HostPlatform::new("aix", "ppc64"));
        let err = generator.generate(WrapperStyle::Node).unwrap_err();
        assert!(matches!(err, DistError::UnsupportedPlatform { .. }));
        assert!(!dir.path().join("bin/mocks.js").exists());
    }

    #[test]
    fn test_shell_and_batch_rendering() {
        let shell = WrapperStyle::Shell.render(Path::new("/it's/mocks"), "mocks").unwrap();
        assert_eq!(shell, "#!/bin/sh\nexec '/it'\\''s/mocks' \"$@\"\n");
        let batch = WrapperStyle::Batch.render(Path::new(r"C:\mocks\mocks.exe"), "mocks").unwrap();
        assert!(batch.starts_with("@echo off\r\n"));
        assert!(batch.contains(r#""C:\mocks\mocks.exe" %*"#));
    }

    #[test]
    fn test_batch_rendering_escapes_percent_and_rejects_quotes() {
        let batch = WrapperStyle::Batch.render(Path::new(r"C:\100%\mocks.exe"), "mocks").unwrap();
        assert!(batch.contains(r#""C:\100%%\mocks.exe" %*"#));

        let err = WrapperStyle::Batch.render(Path::new(r#"C:\a"b\mocks.exe"#), "mocks").unwrap_err();
        assert!(matches!(err, DistError::UnquotablePath { .. }));
    }

    #[test]
    fn test_wrapper_paths_per_style() {
        let configured = Path::new("bin/mocks.js");
        assert_eq!(WrapperStyle::Node.wrapper_path(configured), PathBuf::from("bin/mocks.js"));
        assert_eq!(WrapperStyle::Shell.wrapper_path(configured), PathBuf::from("bin/mocks.sh"));
        assert_eq!(WrapperStyle::Batch.wrapper_path(configured), PathBuf::from("bin/mocks.cmd"));
    }
}
