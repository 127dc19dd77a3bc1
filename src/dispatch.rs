use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;
use crate::error::{DistError, Result};

/// Spawns `binary` with `args`, inheriting stdin, stdout and stderr, and waits
/// for it to exit. No timeout is applied.
///
/// Returns the exit code the parent should terminate with.
///
/// # Errors
/// Returns [`DistError::Spawn`] if the process could not be started.
pub fn dispatch<I, S>(binary: &Path, args: I) -> Result<i32>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    debug!("dispatching to {}", binary.display());
    let status = Command::new(binary)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|source| DistError::Spawn {
            program: binary.to_path_buf(),
            source,
        })?;
    Ok(exit_code(status))
}

/// Like [`dispatch`], but reports a spawn failure on stderr and maps it to 1.
pub fn dispatch_or_report<I, S>(binary: &Path, args: I, name: &str) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    match dispatch(binary, args) {
        Ok(code) => code,
        Err(e) => {
            let reason: &dyn std::fmt::Display = match &e {
                DistError::Spawn { source, .. } => source,
                other => other,
            };
            eprintln!("Failed to start {name}: {reason}");
            1
        }
    }
}

/// Translates a child's status into the parent's exit code.
///
/// A child terminated by a signal yields `128 + signal` on Unix.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[cfg(unix)]
    #[test]
    fn test_exit_code_is_mirrored() {
        let code = dispatch(Path::new("/bin/sh"), ["-c", "exit 7"]).unwrap();
        assert_eq!(code, 7);
        let code = dispatch(Path::new("/bin/sh"), ["-c", "exit 0"]).unwrap();
        assert_eq!(code, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_arguments_are_forwarded_verbatim() {
        let code = dispatch(
            Path::new("/bin/sh"),
            ["-c", "test \"$1\" = \"--port\" && test \"$2\" = \"a b\"", "sh", "--port", "a b"],
        )
        .unwrap();
        assert_eq!(code, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_maps_to_128_plus_signal() {
        let code = dispatch(Path::new("/bin/sh"), ["-c", "kill -TERM $$"]).unwrap();
        assert_eq!(code, 128 + 15);
    }

    #[test]
    fn test_missing_binary_is_a_spawn_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("mocks");
        let err = dispatch(&missing, Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, DistError::Spawn { .. }));
        assert_eq!(dispatch_or_report(&missing, Vec::<String>::new(), "mocks"), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_binary_is_a_spawn_error() {
        let dir = tempdir().unwrap();
        let binary = dir.path().join("mocks");
        std::fs::write(&binary, b"#!/bin/sh\nexit 0\n").unwrap();
        assert_eq!(dispatch_or_report(&binary, Vec::<String>::new(), "mocks"), 1);
    }
}
