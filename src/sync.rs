//! Keeps every derived `package.json` on the canonical version.
//!
//! [`VersionSynchronizer`] rewrites manifests, [`ConsistencyChecker`] only
//! reads them. Both visit the whole [`ManifestSet`] even when individual
//! manifests fail, and report per manifest.

use std::path::{Path, PathBuf};
use colored::Colorize;
use regex::Regex;
use tracing::{debug, warn};
use crate::config::DistConfig;
use crate::error::{DistError, Result};
use crate::manifest::{ManifestSet, PackageManifest, VersionSource};
use crate::platform::PlatformTable;
use crate::util::{display_relative, write_atomic};

#[derive(Debug)]
pub enum SyncOutcome {
    /// The file was rewritten. `from` is the previous `version` field.
    Updated { from: Option<String>, to: String },
    /// Versions were already correct; only the layout was normalized.
    Reformatted,
    Unchanged,
    Missing,
    Failed(DistError),
}

#[derive(Debug)]
pub struct SyncEntry {
    pub path: PathBuf,
    pub outcome: SyncOutcome,
}

#[derive(Debug)]
pub struct SyncReport {
    pub version: String,
    pub entries: Vec<SyncEntry>,
}

impl SyncReport {
    pub fn has_changes(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.outcome, SyncOutcome::Updated { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.outcome, SyncOutcome::Failed(_)))
    }

    /// Turns the report into the first recorded failure, if any.
    pub fn into_result(mut self) -> Result<SyncReport> {
        let failed = self
            .entries
            .iter()
            .position(|e| matches!(e.outcome, SyncOutcome::Failed(_)));
        if let Some(index) = failed {
            if let SyncOutcome::Failed(err) = self.entries.swap_remove(index).outcome {
                return Err(err);
            }
        }
        Ok(self)
    }

    pub fn print(&self, root: &Path) {
        for entry in &self.entries {
            let relative = display_relative(&entry.path, root);
            match &entry.outcome {
                SyncOutcome::Updated { from, to } if from.as_deref() == Some(to.as_str()) => {
                    println!("Updated {relative}: optionalDependencies → {to}");
                }
                SyncOutcome::Updated { from, to } => {
                    let from = from.as_deref().unwrap_or("<none>");
                    println!("Updated {relative}: {from} → {to}");
                }
                SyncOutcome::Reformatted => println!("Reformatted {relative}: {}", self.version),
                SyncOutcome::Unchanged => println!("Unchanged {relative}: {}", self.version),
                // already reported through the `warn!` in sync_one
                SyncOutcome::Missing => {}
                SyncOutcome::Failed(err) => eprintln!("{} {err}", "[ERROR]".red()),
            }
        }
        if self.has_failures() {
            println!("\n{} Version synchronization finished with errors.", "[ERROR]".red());
        } else if self.has_changes() {
            println!("\nVersion synchronization completed.");
            println!("All package.json files have been updated to match the canonical version.");
        } else {
            println!("\nAll versions are already synchronized.");
        }
    }
}

/// Writes the canonical version into every manifest of a [`ManifestSet`].
#[derive(Debug, Clone)]
pub struct VersionSynchronizer {
    manifests: ManifestSet,
    dependency_pattern: Regex,
}

impl VersionSynchronizer {
    pub fn new(manifests: ManifestSet, config: &DistConfig) -> Result<VersionSynchronizer> {
        Ok(VersionSynchronizer {
            manifests,
            dependency_pattern: config.platform_dependency_pattern()?,
        })
    }

    pub fn for_root<P: AsRef<Path>>(root: P, config: &DistConfig) -> Result<VersionSynchronizer> {
        let manifests = ManifestSet::for_config(root, config, &PlatformTable::full());
        VersionSynchronizer::new(manifests, config)
    }

    /// Reads the version from `source`, then synchronizes.
    pub fn run(&self, source: &VersionSource) -> Result<SyncReport> {
        let version = source.read()?;
        Ok(self.sync(&version))
    }

    /// Synchronizes every manifest to `version`. Missing files and per-file
    /// errors are recorded in the report; they never stop the batch.
    pub fn sync(&self, version: &str) -> SyncReport {
        let entries = self
            .manifests
            .paths()
            .iter()
            .map(|path| SyncEntry {
                path: path.clone(),
                outcome: self.sync_one(path, version),
            })
            .collect();
        SyncReport { version: version.to_string(), entries }
    }

    fn sync_one(&self, path: &Path, version: &str) -> SyncOutcome {
        if !path.exists() {
            warn!("{} does not exist", path.display());
            return SyncOutcome::Missing;
        }
        let original = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => return SyncOutcome::Failed(DistError::read(path, e)),
        };
        let mut manifest = match PackageManifest::parse(&original) {
            Ok(manifest) => manifest,
            Err(e) => return SyncOutcome::Failed(DistError::read(path, e)),
        };

        let from = manifest.version().map(str::to_string);
        manifest.set_version(version);
        let dependencies =
            manifest.set_optional_dependencies(version, |name| self.dependency_pattern.is_match(name));

        let rendered = manifest.to_pretty_string();
        if rendered == original {
            debug!("{} already at {version}", path.display());
            return SyncOutcome::Unchanged;
        }
        if let Err(source) = write_atomic(path, rendered.as_bytes(), None) {
            return SyncOutcome::Failed(DistError::ManifestWrite {
                path: path.to_path_buf(),
                source,
            });
        }
        if from.as_deref() == Some(version) && dependencies == 0 {
            SyncOutcome::Reformatted
        } else {
            SyncOutcome::Updated { from, to: version.to_string() }
        }
    }
}

/// A field that disagrees with the canonical version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// `version`, or `optionalDependencies.<name>`.
    pub field: String,
    pub found: Option<String>,
    pub expected: String,
}

#[derive(Debug)]
pub enum CheckOutcome {
    Consistent { version: String },
    Inconsistent(Vec<Mismatch>),
    Missing,
    Failed(DistError),
}

#[derive(Debug)]
pub struct CheckEntry {
    pub path: PathBuf,
    pub outcome: CheckOutcome,
}

#[derive(Debug)]
pub struct CheckReport {
    pub version: String,
    pub entries: Vec<CheckEntry>,
}

impl CheckReport {
    /// True when no manifest mismatches or fails. Missing manifests only warn.
    pub fn is_consistent(&self) -> bool {
        self.entries.iter().all(|e| {
            matches!(e.outcome, CheckOutcome::Consistent { .. } | CheckOutcome::Missing)
        })
    }

    pub fn mismatches(&self) -> impl Iterator<Item = (&Path, &Mismatch)> {
        self.entries.iter().flat_map(|e| {
            let list: &[Mismatch] = match &e.outcome {
                CheckOutcome::Inconsistent(list) => list,
                _ => &[],
            };
            list.iter().map(move |m| (e.path.as_path(), m))
        })
    }

    pub fn print(&self, root: &Path) {
        for entry in &self.entries {
            let relative = display_relative(&entry.path, root);
            match &entry.outcome {
                CheckOutcome::Consistent { version } => {
                    println!("{} {relative}: {version}", "[OK]".green())
                }
                CheckOutcome::Inconsistent(mismatches) => {
                    for m in mismatches {
                        let found = m.found.as_deref().unwrap_or("<none>");
                        eprintln!(
                            "{} Version mismatch in {relative} {}: {found} (expected: {})",
                            "[ERROR]".red(),
                            m.field,
                            m.expected
                        );
                    }
                }
                CheckOutcome::Missing => {}
                CheckOutcome::Failed(err) => eprintln!("{} {err}", "[ERROR]".red()),
            }
        }
        if self.is_consistent() {
            println!("\n{} All versions are consistent!", "[OK]".green());
        } else {
            println!("\n{} Version inconsistencies detected!", "[ERROR]".red());
        }
    }
}

/// Read-only audit of a [`ManifestSet`] against the canonical version.
#[derive(Debug, Clone)]
pub struct ConsistencyChecker {
    manifests: ManifestSet,
    dependency_pattern: Regex,
}

impl ConsistencyChecker {
    pub fn new(manifests: ManifestSet, config: &DistConfig) -> Result<ConsistencyChecker> {
        Ok(ConsistencyChecker {
            manifests,
            dependency_pattern: config.platform_dependency_pattern()?,
        })
    }

    pub fn for_root<P: AsRef<Path>>(root: P, config: &DistConfig) -> Result<ConsistencyChecker> {
        let manifests = ManifestSet::for_config(root, config, &PlatformTable::full());
        ConsistencyChecker::new(manifests, config)
    }

    pub fn run(&self, source: &VersionSource) -> Result<CheckReport> {
        let version = source.read()?;
        Ok(self.check(&version))
    }

    pub fn check(&self, version: &str) -> CheckReport {
        let entries = self
            .manifests
            .paths()
            .iter()
            .map(|path| CheckEntry {
                path: path.clone(),
                outcome: self.check_one(path, version),
            })
            .collect();
        CheckReport { version: version.to_string(), entries }
    }

    fn check_one(&self, path: &Path, version: &str) -> CheckOutcome {
        if !path.exists() {
            warn!("{} does not exist", path.display());
            return CheckOutcome::Missing;
        }
        let manifest = match PackageManifest::load(path) {
            Ok(manifest) => manifest,
            Err(e) => return CheckOutcome::Failed(e),
        };

        let mut mismatches = Vec::new();
        if manifest.version() != Some(version) {
            mismatches.push(Mismatch {
                field: "version".to_string(),
                found: manifest.version().map(str::to_string),
                expected: version.to_string(),
            });
        }
        for (name, value) in manifest.matching_dependencies(|name| self.dependency_pattern.is_match(name)) {
            if value.as_str() != Some(version) {
                let found = match value.as_str() {
                    Some(dep_version) => dep_version.to_string(),
                    None => value.to_string(),
                };
                mismatches.push(Mismatch {
                    field: format!("optionalDependencies.{name}"),
                    found: Some(found),
                    expected: version.to_string(),
                });
            }
        }

        if mismatches.is_empty() {
            CheckOutcome::Consistent { version: version.to_string() }
        } else {
            CheckOutcome::Inconsistent(mismatches)
        }
    }
}
