//! Staging files: `<target>.tmp`, removed on every exit path.
//!
//! A [`StagingFile`] owns its path for the rest of the run. Dropping it
//! removes the file; only [`StagingFile::persist`] (a successful rename onto
//! the target) disarms that.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};

/// Suffix appended to a target path to form its staging path.
pub const STAGING_SUFFIX: &str = ".tmp";

/// `<target>.tmp`: pure, no I/O.
pub fn staging_path_for(target: &Path) -> PathBuf {
    let mut raw: OsString = target.as_os_str().to_owned();
    raw.push(STAGING_SUFFIX);
    PathBuf::from(raw)
}

/// A staged copy of incoming content awaiting the commit decision.
#[derive(Debug)]
pub struct StagingFile {
    path: PathBuf,
    file: Option<File>,
    armed: bool,
}

impl StagingFile {
    /// Create (or truncate a stale) staging file for `target`, chmod'd to `mode`.
    pub fn create(target: &Path, mode: u32) -> Result<Self, SyncError> {
        let path = staging_path_for(target);
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }
        let file = options.open(&path).map_err(|e| io_err(&path, e))?;
        // Armed from here on: any failure below still removes the file.
        // The chmod also covers umask and stale files that kept an old mode.
        let staging = Self {
            path,
            file: Some(file),
            armed: true,
        };
        staging.chmod(mode)?;
        Ok(staging)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush content to disk and close the handle.
    pub fn finish(&mut self) -> Result<(), SyncError> {
        if let Some(file) = self.file.take() {
            file.sync_all().map_err(|e| io_err(&self.path, e))?;
        }
        Ok(())
    }

    /// Rename onto `target`. On failure the staging file is still removed.
    pub fn persist(mut self, target: &Path) -> io::Result<()> {
        self.file.take();
        std::fs::rename(&self.path, target)?;
        self.armed = false;
        Ok(())
    }

    #[cfg(unix)]
    fn chmod(&self, mode: u32) -> Result<(), SyncError> {
        use std::os::unix::fs::PermissionsExt;
        if let Some(file) = &self.file {
            file.set_permissions(std::fs::Permissions::from_mode(mode))
                .map_err(|e| io_err(&self.path, e))?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn chmod(&self, _mode: u32) -> Result<(), SyncError> {
        Ok(())
    }

    fn handle(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("staging file already closed"))
    }
}

impl Write for StagingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.handle()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.handle()?.flush()
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        self.file.take();
        if self.armed {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!("failed to remove staging file {}: {e}", self.path.display());
                }
            }
        }
    }
}

/// Parent directories created for new targets during one run.
///
/// Dropping the guard removes them again, deepest first and only while
/// empty, unless [`CreatedDirs::keep`] was called once the renames landed.
#[derive(Debug, Default)]
pub struct CreatedDirs {
    dirs: Vec<PathBuf>,
    kept: bool,
}

impl CreatedDirs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create every missing ancestor of `target`, remembering each one.
    pub fn ensure_parent(&mut self, target: &Path) -> Result<(), SyncError> {
        let Some(parent) = target.parent() else {
            return Ok(());
        };
        let missing: Vec<&Path> = parent
            .ancestors()
            .take_while(|dir| !dir.as_os_str().is_empty() && !dir.exists())
            .collect();
        for dir in missing.into_iter().rev() {
            match std::fs::create_dir(dir) {
                Ok(()) => {
                    tracing::debug!("created directory {}", dir.display());
                    self.dirs.push(dir.to_path_buf());
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(io_err(dir, e)),
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// The run committed: leave every created directory in place.
    pub fn keep(mut self) {
        self.kept = true;
    }
}

impl Drop for CreatedDirs {
    fn drop(&mut self) {
        if self.kept {
            return;
        }
        // Creation order is parent before child, so reverse is deepest first.
        for dir in self.dirs.iter().rev() {
            if let Err(e) = std::fs::remove_dir(dir) {
                tracing::debug!("left directory {} in place: {e}", dir.display());
            }
        }
    }
}

/// True when `target` cannot be staged without creating directories.
pub fn parent_missing(target: &Path) -> bool {
    target
        .parent()
        .is_some_and(|p| !p.as_os_str().is_empty() && !p.exists())
}
