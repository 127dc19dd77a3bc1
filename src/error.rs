use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while resolving platform binaries or synchronizing
/// package versions.
#[derive(Debug, Error)]
pub enum DistError {
    /// The (OS, architecture) pair is not in the platform table.
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// The platform is known but no executable was found on disk.
    #[error(
        "Binary not found for platform: {platform}. \
         Please install the matching platform package manually: npm install {package}"
    )]
    BinaryNotFound {
        platform: String,
        package: String,
        searched: Vec<PathBuf>,
    },

    /// The canonical manifest declares no version.
    #[error("Could not find version in {}", path.display())]
    MissingVersion { path: PathBuf },

    /// The canonical manifest declares a version that is not semver.
    #[error("Invalid version `{version}` in {}: {source}", path.display())]
    InvalidVersion {
        path: PathBuf,
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("Error reading {}: {source}", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Error writing {}: {source}", path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Git working directory is not clean. Please commit or stash your changes first.\nUncommitted changes:\n{changes}")]
    UncleanWorkingTree { changes: String },

    #[error("`{tool}` failed: {reason}")]
    ExternalTool { tool: String, reason: String },

    #[error("Invalid configuration in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The path cannot be embedded in a wrapper of the requested style.
    #[error("Cannot embed {} in a {style} wrapper", path.display())]
    UnquotablePath { path: PathBuf, style: String },

    #[error("Invalid package naming pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Failed to start {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DistError>;

impl DistError {
    pub(crate) fn read<E>(path: impl Into<PathBuf>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        DistError::ManifestRead {
            path: path.into(),
            source: source.into(),
        }
    }
}
