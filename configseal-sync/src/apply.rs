//! Atomic applier: commit the Apply Set by rename.
//!
//! Each rename is atomic on its own (same filesystem), but the set as a whole
//! is not: if a rename fails, earlier renames stay in place and the error is
//! a [`SyncError::PartialApply`] listing them. Records not yet renamed are
//! dropped, which removes their staging files.

use std::path::{Path, PathBuf};

use filetime::FileTime;

use crate::differ::set_times;
use crate::error::SyncError;
use crate::staging::StagingFile;

/// A staged file waiting to replace its target.
#[derive(Debug)]
pub struct PendingRename {
    pub target: PathBuf,
    pub staging: StagingFile,
    pub mtime: FileTime,
}

/// Ordered list of pending renames, in archive order.
#[derive(Debug, Default)]
pub struct ApplySet {
    pending: Vec<PendingRename>,
}

impl ApplySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: PendingRename) {
        self.pending.push(record);
    }

    /// Drop any earlier record for `target` (removing its staging file).
    ///
    /// Returns whether one was present. Used when an archive repeats a name:
    /// the last occurrence wins.
    pub fn discard(&mut self, target: &Path) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.target != target);
        before != self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn targets(&self) -> impl Iterator<Item = &Path> {
        self.pending.iter().map(|p| p.target.as_path())
    }

    /// Rename every staged file onto its target, in insertion order.
    ///
    /// Returns the applied target paths.
    pub fn apply(self) -> Result<Vec<PathBuf>, SyncError> {
        let mut applied = Vec::with_capacity(self.pending.len());
        for PendingRename {
            target,
            staging,
            mtime,
        } in self.pending
        {
            let staging_path = staging.path().to_path_buf();
            if let Err(source) = staging.persist(&target) {
                tracing::warn!(
                    "rename {} -> {} failed after {} applied",
                    staging_path.display(),
                    target.display(),
                    applied.len()
                );
                return Err(SyncError::PartialApply {
                    applied,
                    path: target,
                    source,
                });
            }
            if let Err(e) = set_times(&target, mtime) {
                tracing::warn!("could not restore mtime on {}: {e}", target.display());
            }
            tracing::info!("wrote: {}", target.display());
            applied.push(target);
        }
        Ok(applied)
    }
}
