mod cli;
mod execute;

use std::process::ExitCode;
use clap::Parser;
use crate::cli::CLI;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let cli = CLI::parse();
    let code = execute::execute(cli)?;
    // codes outside 0..=255 cannot be reported faithfully
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}
