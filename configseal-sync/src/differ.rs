//! Streaming differ: stage incoming content while comparing it to disk.
//!
//! Content is copied into the staging file in [`CHUNK_SIZE`] chunks. Each
//! chunk is compared against an equal-length read from the current target.
//! The first mismatch or short read marks the entry changed; from then on
//! chunks are only written. Once the content is exhausted, the target must be
//! exhausted too (tail check), so equal-prefix files of different length
//! still count as changed. Neither file is ever held in memory whole.

use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read, Write};
use std::path::Path;

use filetime::FileTime;

use crate::apply::PendingRename;
use crate::error::{corrupt, io_err, SyncError};
use crate::staging::StagingFile;

/// Copy/compare granularity.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// What the incoming content is compared against.
#[derive(Debug)]
pub enum Comparison {
    /// First sync of this path: everything is new.
    NoExistingFile,
    /// Read-only handle on the current target.
    ExistingFile(BufReader<File>),
}

impl Comparison {
    /// Open `target` for comparison. Only `NotFound` means "absent".
    pub fn open(target: &Path) -> Result<Self, SyncError> {
        match File::open(target) {
            Ok(file) => Ok(Comparison::ExistingFile(BufReader::new(file))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Comparison::NoExistingFile),
            Err(e) => Err(io_err(target, e)),
        }
    }

    /// Does the next `chunk.len()` bytes of the existing file equal `chunk`?
    fn matches_next(&mut self, chunk: &[u8], scratch: &mut Vec<u8>) -> bool {
        match self {
            Comparison::NoExistingFile => false,
            Comparison::ExistingFile(reader) => {
                scratch.resize(chunk.len(), 0);
                match reader.read_exact(scratch) {
                    Ok(()) => scratch.as_slice() == chunk,
                    Err(_) => false,
                }
            }
        }
    }

    /// Tail check: has the existing file been fully consumed?
    fn at_eof(&mut self) -> bool {
        match self {
            Comparison::NoExistingFile => false,
            Comparison::ExistingFile(reader) => {
                let mut probe = [0u8; 1];
                loop {
                    match reader.read(&mut probe) {
                        Ok(0) => return true,
                        Ok(_) => return false,
                        Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                        Err(_) => return false,
                    }
                }
            }
        }
    }
}

/// Outcome of staging one entry.
#[derive(Debug)]
pub enum Verdict {
    /// Content identical; staging removed, target untouched.
    Unchanged,
    /// Content differs or target absent; staged and ready to rename.
    Changed(PendingRename),
}

/// Incoming file metadata as declared by the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declared {
    pub mode: u32,
    pub mtime: FileTime,
    pub size: u64,
}

/// Stage `content` for `target` and decide whether it changed.
pub fn stage_entry(
    target: &Path,
    declared: Declared,
    content: &mut impl Read,
) -> Result<Verdict, SyncError> {
    let mut comparison = Comparison::open(target)?;
    let mut staging = StagingFile::create(target, declared.mode)?;
    let mut changed = matches!(comparison, Comparison::NoExistingFile);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut scratch = Vec::new();
    let mut copied: u64 = 0;

    loop {
        let n = match content.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(corrupt(format!(
                    "failed to read {} from bundle: {e}",
                    target.display()
                )))
            }
        };
        staging
            .write_all(&chunk[..n])
            .map_err(|e| io_err(staging.path(), e))?;
        copied += n as u64;

        if !changed && !comparison.matches_next(&chunk[..n], &mut scratch) {
            changed = true;
        }
    }

    check_size(target, declared, copied)?;

    if !changed && !comparison.at_eof() {
        changed = true;
    }

    if !changed {
        tracing::debug!("unchanged: {}", target.display());
        return Ok(Verdict::Unchanged);
    }

    staging.finish()?;
    if let Err(e) = set_times(staging.path(), declared.mtime) {
        tracing::warn!("could not set mtime on {}: {e}", staging.path().display());
    }
    tracing::debug!("changed: {}", target.display());
    Ok(Verdict::Changed(PendingRename {
        target: target.to_path_buf(),
        staging,
        mtime: declared.mtime,
    }))
}

pub(crate) fn set_times(path: &Path, mtime: FileTime) -> io::Result<()> {
    filetime::set_file_times(path, mtime, mtime)
}

/// Read past an entry without staging it. The declared size is still checked.
pub fn skip_entry(
    target: &Path,
    declared: Declared,
    content: &mut impl Read,
) -> Result<(), SyncError> {
    let copied = io::copy(content, &mut io::sink()).map_err(|e| {
        corrupt(format!(
            "failed to read {} from bundle: {e}",
            target.display()
        ))
    })?;
    check_size(target, declared, copied)
}

fn check_size(target: &Path, declared: Declared, copied: u64) -> Result<(), SyncError> {
    if copied != declared.size {
        return Err(corrupt(format!(
            "entry {} truncated: declared {} bytes, read {copied}",
            target.display(),
            declared.size
        )));
    }
    Ok(())
}
