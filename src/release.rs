use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::info;
use crate::config::DistConfig;
use crate::error::{DistError, Result};
use crate::manifest::VersionSource;
use crate::sync::{SyncReport, VersionSynchronizer};

/// A command to run on behalf of the release pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Stream output to the terminal instead of capturing it.
    pub inherit_output: bool,
}

impl Invocation {
    pub fn captured(program: &str, args: &[&str], cwd: &Path) -> Invocation {
        Invocation {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: cwd.to_path_buf(),
            inherit_output: false,
        }
    }

    pub fn inherited(program: &str, args: &[&str], cwd: &Path) -> Invocation {
        Invocation {
            inherit_output: true,
            ..Invocation::captured(program, args, cwd)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    /// Empty when output was inherited.
    pub stdout: String,
    pub stderr: String,
}

/// Executes external commands. Swapped for a recording double in tests.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput>;
}

/// Runs commands with [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).current_dir(&invocation.cwd);
        if invocation.inherit_output {
            let status = command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()?;
            return Ok(CommandOutput {
                success: status.success(),
                code: status.code(),
                ..CommandOutput::default()
            });
        }
        let output = command.output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// What a successful release preparation produced.
#[derive(Debug)]
pub struct ReleaseSummary {
    pub version: String,
    pub sync: SyncReport,
    pub next_steps: String,
}

/// Fail-fast release pipeline: clean tree, canonical version, sync,
/// changelog, operator instructions. Nothing is rolled back on failure.
#[derive(Debug)]
pub struct ReleasePreparer<'a, R: CommandRunner> {
    root: PathBuf,
    config: &'a DistConfig,
    runner: R,
}

impl<'a, R: CommandRunner> ReleasePreparer<'a, R> {
    pub fn new<P: AsRef<Path>>(root: P, config: &'a DistConfig, runner: R) -> ReleasePreparer<'a, R> {
        ReleasePreparer {
            root: root.as_ref().to_path_buf(),
            config,
            runner,
        }
    }

    pub fn prepare(&self) -> Result<ReleaseSummary> {
        println!("Starting release preparation...\n");

        self.check_clean_tree()?;
        println!("✓ Git working directory is clean");

        let version = VersionSource::new(self.root.join(&self.config.canonical_manifest)).read()?;
        println!("Current version: {version}\n");

        println!("Synchronizing versions across package files...");
        let sync = VersionSynchronizer::for_root(&self.root, self.config)?.sync(&version);
        sync.print(&self.root);
        let sync = sync.into_result()?;
        println!("✓ Version synchronization completed");

        println!("Updating CHANGELOG.md for version {version}...");
        self.generate_changelog(&version)?;
        println!("✓ CHANGELOG.md updated successfully");

        let next_steps = next_steps(&version, &self.config.base_branch);
        Ok(ReleaseSummary { version, sync, next_steps })
    }

    /// Fails with [`DistError::UncleanWorkingTree`] when git reports changes.
    pub fn check_clean_tree(&self) -> Result<()> {
        let invocation = Invocation::captured("git", &["status", "--porcelain"], &self.root);
        let output = self.runner.run(&invocation).map_err(|e| DistError::ExternalTool {
            tool: "git".to_string(),
            reason: e.to_string(),
        })?;
        if !output.success {
            return Err(DistError::ExternalTool {
                tool: "git".to_string(),
                reason: output.stderr.trim().to_string(),
            });
        }
        let changes = output.stdout.trim_end();
        if !changes.is_empty() {
            return Err(DistError::UncleanWorkingTree { changes: changes.to_string() });
        }
        info!("working tree is clean");
        Ok(())
    }

    pub fn generate_changelog(&self, version: &str) -> Result<()> {
        let tool = &self.config.changelog_tool;
        let invocation = Invocation::inherited(tool, &["--tag", version], &self.root);
        let hint = format!("Make sure {tool} is installed: cargo install {tool}");
        let output = self.runner.run(&invocation).map_err(|e| DistError::ExternalTool {
            tool: tool.clone(),
            reason: format!("{e}. {hint}"),
        })?;
        if !output.success {
            let code = output
                .code
                .map_or_else(|| "a signal".to_string(), |c| format!("code {c}"));
            return Err(DistError::ExternalTool {
                tool: tool.clone(),
                reason: format!("exited with {code}. {hint}"),
            });
        }
        Ok(())
    }
}

/// Operator instructions printed after a successful preparation.
pub fn next_steps(version: &str, base_branch: &str) -> String {
    let rule = "=".repeat(60);
    let branch = format!("chore/changelog-update-v{version}");
    let mut out = String::new();
    out.push_str(&format!("\n{rule}\nRELEASE PREPARATION COMPLETED\n{rule}\n"));
    out.push_str(&format!("Version: {version}\n"));
    out.push_str("\nNext steps:\n");
    out.push_str("\n1. Pull latest changes and create branch:\n");
    out.push_str(&format!("   git pull origin {base_branch}\n"));
    out.push_str(&format!("   git checkout -b {branch}\n"));
    out.push_str("\n2. Commit and push changes:\n");
    out.push_str("   git add CHANGELOG.md\n");
    out.push_str(&format!(
        "   git commit -m \"chore(changelog): Update changelog for v{version}\"\n"
    ));
    out.push_str(&format!("   git push origin {branch}\n"));
    out.push_str("\n3. Create Pull Request:\n");
    out.push_str(&format!(
        "   gh pr create --title \"Update changelog for v{version}\" --body \"Automated changelog update for version {version}\"\n"
    ));
    out.push_str("\n4. After PR creation, verify:\n");
    out.push_str("   - CI/CD workflows pass successfully\n");
    out.push_str("   - No existing CHANGELOG update PRs conflict\n");
    out.push_str("   - Review and merge when ready\n");
    out.push_str(&format!("\n{rule}"));
    out
}
