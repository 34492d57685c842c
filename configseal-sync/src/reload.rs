//! Reload trigger: run the configured command once after changes land.

use std::process::{Command, Stdio};

use crate::error::SyncError;

/// Run `command` through `sh -c` with inherited stdout/stderr.
///
/// A launch failure or a non-zero exit is a [`SyncError::Reload`]; files
/// already applied are left as they are.
pub fn trigger(command: &str) -> Result<(), SyncError> {
    tracing::info!("running reload command: {command}");
    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| reload_err(command, format!("could not launch: {e}")))?;

    if !status.success() {
        return Err(reload_err(command, format!("exited with {status}")));
    }
    Ok(())
}

fn reload_err(command: &str, reason: String) -> SyncError {
    SyncError::Reload {
        command: command.to_string(),
        reason,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn successful_command_runs_once() {
        let tmp = TempDir::new().unwrap();
        let marker = tmp.path().join("reloaded");
        trigger(&format!("echo reload >> '{}'", marker.display())).unwrap();
        assert_eq!(std::fs::read_to_string(&marker).unwrap(), "reload\n");
    }

    #[test]
    fn non_zero_exit_is_reload_failure() {
        let err = trigger("exit 3").unwrap_err();
        assert_eq!(err.kind(), "ReloadFailure");
        assert!(err.to_string().contains("exit 3"), "{err}");
    }
}
