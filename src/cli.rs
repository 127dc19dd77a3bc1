use std::path::PathBuf;
use clap::{Parser, Subcommand};
use mocks_dist::WrapperStyle;

#[derive(Debug, Parser, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct CLI {
    /// Repository root for version commands, umbrella package root for
    /// `install`, `run` and `which`. Defaults to the current directory
    #[clap(long, global = true)]
    pub(crate) root: Option<PathBuf>,
    #[command(subcommand)]
    pub(crate) command: DistCommand,
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum DistCommand {
    /// Keep every package.json on the version declared in Cargo.toml
    SyncVersions {
        #[command(subcommand)]
        action: SyncAction,
    },
    /// Check for a clean tree, sync versions, update the changelog and print the next steps
    PrepareRelease,
    /// Resolve the binary for this host and write the dispatcher script
    Install {
        /// Kind of dispatcher script to write
        #[clap(long, value_enum, default_value_t = WrapperStyle::Node)]
        style: WrapperStyle,
    },
    /// Run the binary for this host, passing all arguments through
    #[command(disable_help_flag = true)]
    Run {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Output the platform, package and binary path resolved for this host
    Which,
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum SyncAction {
    /// Synchronize all package.json versions with Cargo.toml
    Sync,
    /// Check version consistency (exits with 1 if inconsistent)
    Check,
}
