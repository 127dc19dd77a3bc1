use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use colored::Colorize;
use mocks_dist::*;
use crate::cli::{DistCommand, SyncAction, CLI};

/// Runs the parsed command and returns the process exit code.
pub fn execute(cli: CLI) -> Result<i32> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let config = DistConfig::load_or_default(&root)?;
    match cli.command {
        DistCommand::SyncVersions { action: SyncAction::Sync } => {
            execute_sync(&root, &config)
        }
        DistCommand::SyncVersions { action: SyncAction::Check } => {
            execute_check(&root, &config)
        }
        DistCommand::PrepareRelease => {
            execute_prepare_release(&root, &config)
        }
        DistCommand::Install { style } => {
            execute_install(&root, &config, style)
        }
        DistCommand::Run { args } => {
            Ok(execute_run(&root, &config, args))
        }
        DistCommand::Which => {
            execute_which(&root, &config)
        }
    }
}

fn canonical_source(root: &Path, config: &DistConfig) -> VersionSource {
    VersionSource::new(root.join(&config.canonical_manifest))
}

pub fn execute_sync(root: &Path, config: &DistConfig) -> Result<i32> {
    let version = canonical_source(root, config).read()?;
    println!("{} version: {version}", config.canonical_manifest.display());
    let report = VersionSynchronizer::for_root(root, config)?.sync(&version);
    report.print(root);
    Ok(if report.has_failures() { 1 } else { 0 })
}

pub fn execute_check(root: &Path, config: &DistConfig) -> Result<i32> {
    let version = canonical_source(root, config).read()?;
    println!("Checking version consistency. Expected version: {version}");
    let report = ConsistencyChecker::for_root(root, config)?.check(&version);
    report.print(root);
    Ok(if report.is_consistent() { 0 } else { 1 })
}

pub fn execute_prepare_release(root: &Path, config: &DistConfig) -> Result<i32> {
    let summary = ReleasePreparer::new(root, config, SystemRunner).prepare()?;
    println!("{}", summary.next_steps);
    Ok(0)
}

pub fn execute_install(root: &Path, config: &DistConfig, style: WrapperStyle) -> Result<i32> {
    let table = PlatformTable::full();
    let generated = WrapperGenerator::new(root, config, &table, HostPlatform::detect())
        .generate(style)
        .with_context(|| format!("Failed to install {}", config.binary))?;
    println!(
        "{} binary wrapper created successfully: {} → {}",
        config.binary,
        generated.wrapper.display(),
        generated.binary.display()
    );
    Ok(0)
}

fn locate_host_binary(root: &Path, config: &DistConfig) -> mocks_dist::Result<(ResolvedPlatform, PathBuf)> {
    let resolved = HostPlatform::detect().resolve(&PlatformTable::full(), config)?;
    let binary = BinaryLocator::new(root, config).locate(&resolved)?;
    Ok((resolved, binary))
}

pub fn execute_run(root: &Path, config: &DistConfig, args: Vec<String>) -> i32 {
    match locate_host_binary(root, config) {
        Ok((_, binary)) => dispatch_or_report(&binary, args, &config.binary),
        Err(e) => {
            eprintln!("{} {e}", "Error:".red());
            eprintln!();
            eprintln!("Please install the appropriate platform package:");
            for platform in PlatformTable::full().platforms() {
                eprintln!("  npm install {:<32} # {}", config.platform_package(*platform), platform);
            }
            1
        }
    }
}

pub fn execute_which(root: &Path, config: &DistConfig) -> Result<i32> {
    let resolved = HostPlatform::detect().resolve(&PlatformTable::full(), config)?;
    println!("Platform: {}", resolved.platform);
    println!("Package: {}", resolved.package_name);
    match BinaryLocator::new(root, config).lookup(&resolved) {
        BinaryReference::Resolved { path, source } => {
            let source = match source {
                BinarySource::OptionalDependency => "optional dependency",
                BinarySource::Fallback => "fallback",
            };
            println!("Found executable at: {} ({source})", path.display());
            Ok(0)
        }
        BinaryReference::Unresolved { .. } => {
            println!("No installed binary found");
            Ok(1)
        }
    }
}
