//! Sync engine: decrypt, diff, apply, reload.
//!
//! ## `sync_bundle` protocol
//!
//! 1. Open (authenticate + decrypt) the sealed bundle.
//! 2. Iterate regular-file entries of the tar payload.
//! 3. Stage each entry to `<target>.tmp`, comparing against the target.
//! 4. Unchanged → staging removed. Changed → record joins the Apply Set.
//! 5. After the whole archive is read: rename every record into place.
//! 6. Run the reload command once, only if step 5 renamed anything.
//!
//! Nothing under the target directory is renamed before step 5, so any
//! failure in steps 1-4 leaves every target untouched. Parent directories
//! created for new entries in step 3 are removed again if the run stops
//! before step 5 completes. A dry run never creates them.
//!
//! An entry whose target is another entry's staging path (`a.conf` and
//! `a.conf.tmp` in one bundle) is rejected as a corrupt archive.

use std::collections::HashSet;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use configseal_core::{seal, Key, SyncConfig};

use crate::apply::ApplySet;
use crate::archive::ArchiveReader;
use crate::differ::{skip_entry, stage_entry, Declared, Verdict};
use crate::error::{corrupt, SyncError};
use crate::reload;
use crate::staging::{parent_missing, staging_path_for, CreatedDirs};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome for one archive entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteResult {
    /// Content changed (or target was absent) and the file was replaced.
    Written { path: PathBuf },
    /// Content identical; target left untouched.
    Unchanged { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been replaced.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }
}

/// Summary of one sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub target_dir: PathBuf,
    pub writes: Vec<WriteResult>,
    pub reloaded: bool,
    pub dry_run: bool,
    pub synced_at: DateTime<Utc>,
}

impl SyncReport {
    /// Entries written (or that would be, in dry-run mode).
    pub fn changed(&self) -> usize {
        self.writes
            .iter()
            .filter(|w| !matches!(w, WriteResult::Unchanged { .. }))
            .count()
    }

    pub fn unchanged(&self) -> usize {
        self.writes.len() - self.changed()
    }

    /// True when no entry differed from the target directory.
    pub fn is_noop(&self) -> bool {
        self.changed() == 0
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// The slice of [`SyncConfig`] the engine needs once bytes are in hand.
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions<'a> {
    pub target_dir: &'a Path,
    pub reload: Option<&'a str>,
    pub dry_run: bool,
}

impl<'a> SyncOptions<'a> {
    pub fn from_config(config: &'a SyncConfig) -> Self {
        Self {
            target_dir: &config.target,
            reload: config.reload.as_deref(),
            dry_run: config.dry_run,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Authenticate, decrypt and sync an already-fetched sealed bundle.
pub fn sync_bundle(
    sealed: &[u8],
    key: &Key,
    options: &SyncOptions<'_>,
) -> Result<SyncReport, SyncError> {
    let payload = seal::open(key, sealed)?;
    tracing::debug!("bundle authenticated ({} plaintext bytes)", payload.len());
    sync_payload(Cursor::new(payload), options)
}

/// Sync a decrypted tar payload into `options.target_dir`.
pub fn sync_payload(
    payload: impl Read,
    options: &SyncOptions<'_>,
) -> Result<SyncReport, SyncError> {
    let mut reader = ArchiveReader::new(payload);
    // Declared before the apply set so staging files are dropped first.
    let mut created = CreatedDirs::new();
    let mut apply_set = ApplySet::new();
    let mut writes: Vec<WriteResult> = Vec::new();
    let mut targets: HashSet<PathBuf> = HashSet::new();
    let mut stagings: HashSet<PathBuf> = HashSet::new();

    for entry in reader.entries()? {
        let mut entry = entry?;
        let target = options.target_dir.join(entry.name());
        let staging = staging_path_for(&target);
        if stagings.contains(&target) || targets.contains(&staging) {
            return Err(corrupt(format!(
                "entry {} collides with the staging file of another entry",
                entry.name().display()
            )));
        }
        targets.insert(target.clone());
        stagings.insert(staging);

        if apply_set.discard(&target) || writes.iter().any(|w| w.path() == target) {
            tracing::warn!("duplicate entry {}; last one wins", entry.name().display());
            writes.retain(|w| w.path() != target);
        }

        let declared = Declared {
            mode: entry.mode(),
            mtime: entry.mtime(),
            size: entry.size(),
        };
        if options.dry_run && parent_missing(&target) {
            skip_entry(&target, declared, &mut entry)?;
            tracing::debug!("new directory needed for {}", target.display());
            writes.push(WriteResult::WouldWrite { path: target });
            continue;
        }
        created.ensure_parent(&target)?;

        match stage_entry(&target, declared, &mut entry)? {
            Verdict::Unchanged => writes.push(WriteResult::Unchanged { path: target }),
            Verdict::Changed(pending) => {
                apply_set.push(pending);
                writes.push(WriteResult::WouldWrite { path: target });
            }
        }
    }

    let mut report = SyncReport {
        target_dir: options.target_dir.to_path_buf(),
        writes,
        reloaded: false,
        dry_run: options.dry_run,
        synced_at: Utc::now(),
    };

    if report.is_noop() {
        tracing::info!("No changes");
        return Ok(report);
    }

    if options.dry_run {
        for write in &report.writes {
            if let WriteResult::WouldWrite { path } = write {
                tracing::info!("[dry-run] would write: {}", path.display());
            }
        }
        // Dropping the set removes every staging file.
        return Ok(report);
    }

    apply_set.apply()?;
    created.keep();
    for write in &mut report.writes {
        if let WriteResult::WouldWrite { path } = write {
            *write = WriteResult::Written {
                path: std::mem::take(path),
            };
        }
    }

    match options.reload {
        Some(command) => {
            reload::trigger(command)?;
            report.reloaded = true;
        }
        None => tracing::info!("changes applied; no reload command configured"),
    }
    Ok(report)
}
