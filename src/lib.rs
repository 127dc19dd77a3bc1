//! # mocks-dist
//!
//! Ships the natively compiled `mocks` server through npm, which can only
//! distribute interpreted code. Two independent halves live here:
//!
//! - **Runtime path**: decide which per-platform package applies to the host,
//!   find its executable, and either dispatch to it directly or write a small
//!   dispatcher script at install time.
//! - **Release path**: read the one canonical version from `Cargo.toml`, keep
//!   every publishable `package.json` (and its platform `optionalDependencies`)
//!   on it, audit that they agree, and prepare a release.
//!
//! ## Modules Overview
//! - [`platform`] – Supported (OS, architecture) table and host detection
//! - [`locator`] – Finding the installed binary of a platform package
//! - [`dispatch`] – Running the binary with inherited I/O and mirrored exit code
//! - [`wrapper`] – Install-time dispatcher script generation
//! - [`manifest`] – Canonical version source and npm package manifests
//! - [`sync`] – Version synchronization and consistency checking
//! - [`release`] – Release preparation pipeline
//! - [`config`] – Distribution layout (`npm-dist.toml`)
//! - [`error`] – Error taxonomy
//! - [`util`] – Atomic writes and path helpers


pub mod config;
pub mod error;
pub mod platform;
pub mod locator;
pub mod dispatch;
pub mod wrapper;
pub mod manifest;
pub mod sync;
pub mod release;
pub mod util;

pub use config::*;
pub use error::*;
pub use platform::*;
pub use locator::*;
pub use dispatch::*;
pub use wrapper::*;
pub use manifest::*;
pub use sync::*;
pub use release::*;
pub use util::*;
