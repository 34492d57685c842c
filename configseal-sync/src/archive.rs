//! Archive reader: forward-only iteration over regular-file tar entries.
//!
//! Directories, symlinks, hard links, devices and other entry kinds are
//! skipped and never surfaced. Entry names are validated before anything
//! touches the filesystem: absolute names and names containing `..` are
//! rejected as [`SyncError::CorruptArchive`].

use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use filetime::FileTime;
use serde::Serialize;
use tar::EntryType;

use crate::error::{corrupt, SyncError};

/// Single-pass reader over a decrypted tar payload.
pub struct ArchiveReader<R: Read> {
    archive: tar::Archive<R>,
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            archive: tar::Archive::new(reader),
        }
    }

    /// Lazily iterate the regular-file entries. May only be called once.
    pub fn entries(&mut self) -> Result<Entries<'_, R>, SyncError> {
        let inner = self
            .archive
            .entries()
            .map_err(|e| corrupt(format!("cannot iterate archive: {e}")))?;
        Ok(Entries { inner })
    }
}

/// Iterator returned by [`ArchiveReader::entries`].
pub struct Entries<'a, R: 'a + Read> {
    inner: tar::Entries<'a, R>,
}

impl<'a, R: Read> Iterator for Entries<'a, R> {
    type Item = Result<ArchiveEntry<'a, R>, SyncError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(corrupt(format!("malformed tar header: {e}")))),
            };
            if entry.header().entry_type() != EntryType::Regular {
                tracing::debug!(
                    "skipping non-regular entry {}",
                    String::from_utf8_lossy(&entry.path_bytes())
                );
                continue;
            }
            return Some(ArchiveEntry::from_tar(entry));
        }
    }
}

/// One regular file inside the archive; `Read` yields its content.
pub struct ArchiveEntry<'a, R: 'a + Read> {
    name: PathBuf,
    mode: u32,
    mtime: FileTime,
    size: u64,
    content: tar::Entry<'a, R>,
}

impl<'a, R: Read> ArchiveEntry<'a, R> {
    fn from_tar(content: tar::Entry<'a, R>) -> Result<Self, SyncError> {
        let raw = content
            .path()
            .map_err(|e| corrupt(format!("unreadable entry name: {e}")))?;
        let name = sanitize_name(&raw)?;

        let header = content.header();
        let mode = header
            .mode()
            .map_err(|e| corrupt(format!("bad mode for {}: {e}", name.display())))?
            & 0o7777;
        let secs = header
            .mtime()
            .map_err(|e| corrupt(format!("bad mtime for {}: {e}", name.display())))?;
        let secs = i64::try_from(secs)
            .map_err(|_| corrupt(format!("mtime out of range for {}", name.display())))?;
        let size = content.size();

        Ok(Self {
            name,
            mode,
            mtime: FileTime::from_unix_time(secs, 0),
            size,
            content,
        })
    }

    /// Path relative to the target directory.
    pub fn name(&self) -> &Path {
        &self.name
    }

    /// Permission bits.
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Declared modification time.
    pub fn mtime(&self) -> FileTime {
        self.mtime
    }

    /// Declared content length.
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl<'a, R: Read> Read for ArchiveEntry<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.content.read(buf)
    }
}

/// Metadata of one regular-file entry, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    pub name: PathBuf,
    pub mode: u32,
    pub size: u64,
    pub mtime: i64,
}

/// List the regular-file entries of a decrypted payload without extracting.
pub fn list(payload: impl Read) -> Result<Vec<EntrySummary>, SyncError> {
    let mut reader = ArchiveReader::new(payload);
    let mut out = Vec::new();
    for entry in reader.entries()? {
        let entry = entry?;
        out.push(EntrySummary {
            name: entry.name().to_path_buf(),
            mode: entry.mode(),
            size: entry.size(),
            mtime: entry.mtime().unix_seconds(),
        });
    }
    Ok(out)
}

/// Reduce an entry name to plain relative components, rejecting escapes.
fn sanitize_name(raw: &Path) -> Result<PathBuf, SyncError> {
    let mut clean = PathBuf::new();
    for component in raw.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(corrupt(format!("unsafe entry path {}", raw.display())));
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(corrupt(format!("empty entry path {:?}", raw.display())));
    }
    Ok(clean)
}
