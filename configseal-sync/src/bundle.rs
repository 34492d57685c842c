//! Bundle creation: archive a file set, seal it, write it atomically.
//!
//! Inputs are archived in-process with symlinks followed. Directories are
//! added recursively, and names are stored relative with any leading `/`
//! stripped. The sealed result goes to `<output>.tmp`, is fsynced, then
//! renamed over `<output>`.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use configseal_core::{seal, Key};

use crate::error::{io_err, SyncError};
use crate::staging::StagingFile;

/// Archive, seal and atomically write a bundle. Returns the bytes written.
pub fn create_bundle(key: &Key, output: &Path, inputs: &[PathBuf]) -> Result<usize, SyncError> {
    let archive = build_archive(inputs)?;
    let sealed = seal::seal(key, &archive)?;
    write_atomic(output, &sealed)?;
    tracing::info!(
        "sealed {} input(s) into {} ({} bytes)",
        inputs.len(),
        output.display(),
        sealed.len()
    );
    Ok(sealed.len())
}

/// Build an uncompressed tar of `inputs`, following symlinks.
pub fn build_archive(inputs: &[PathBuf]) -> Result<Vec<u8>, SyncError> {
    let mut builder = tar::Builder::new(Vec::new());
    builder.follow_symlinks(true);

    for input in inputs {
        let name = archive_name(input)?;
        let meta = std::fs::metadata(input).map_err(|e| io_err(input, e))?;
        if meta.is_dir() {
            builder
                .append_dir_all(&name, input)
                .map_err(|e| io_err(input, e))?;
        } else {
            builder
                .append_path_with_name(input, &name)
                .map_err(|e| io_err(input, e))?;
        }
        tracing::debug!("archived {} as {}", input.display(), name.display());
    }

    builder
        .into_inner()
        .map_err(|e| io_err("<archive>", e))
}

/// Name an input is stored under: relative, without `..`.
fn archive_name(input: &Path) -> Result<PathBuf, SyncError> {
    let mut name = PathBuf::new();
    for component in input.components() {
        match component {
            Component::Normal(part) => name.push(part),
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(io_err(
                    input,
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "inputs containing `..` cannot be archived",
                    ),
                ));
            }
        }
    }
    if name.as_os_str().is_empty() {
        name.push(".");
    }
    Ok(name)
}

fn write_atomic(output: &Path, bytes: &[u8]) -> Result<(), SyncError> {
    let mut staging = StagingFile::create(output, 0o644)?;
    staging
        .write_all(bytes)
        .map_err(|e| io_err(staging.path(), e))?;
    staging.finish()?;
    staging.persist(output).map_err(|e| io_err(output, e))
}
