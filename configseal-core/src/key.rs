//! The 32-byte pre-shared key.
//!
//! A [`Key`] is a capability: whoever holds it can open bundles and seal new
//! ones. It is only ever constructed from exactly [`KEY_LEN`] bytes, its
//! `Debug` output is redacted, and its bytes are zeroized on drop.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crypto_secretbox::aead::{rand_core::RngCore, OsRng};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::SealError;

/// Required key length in bytes.
pub const KEY_LEN: usize = 32;

/// Pre-shared symmetric key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Key([u8; KEY_LEN]);

impl Key {
    /// Build a key from raw bytes, rejecting any length other than 32.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SealError> {
        let arr: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| SealError::InvalidKey { len: bytes.len() })?;
        Ok(Self(arr))
    }

    /// Generate a fresh key from the OS random source.
    pub fn generate() -> Result<Self, SealError> {
        let mut bytes = [0u8; KEY_LEN];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| SealError::Randomness(e.to_string()))?;
        let key = Self(bytes);
        bytes.zeroize();
        Ok(key)
    }

    /// Read a key file. The file must contain exactly 32 raw bytes.
    pub fn load(path: &Path) -> Result<Self, SealError> {
        let mut raw = fs::read(path).map_err(|e| key_file_err(path, e))?;
        let key = Self::from_slice(&raw);
        raw.zeroize();
        key
    }

    /// Write this key to `path` with owner-only permissions and fsync it.
    ///
    /// Refuses to replace an existing file unless `overwrite` is set.
    pub fn write_to(&self, path: &Path, overwrite: bool) -> Result<(), SealError> {
        let mut options = OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path).map_err(|e| key_file_err(path, e))?;
        // `mode` only applies on creation; tighten a pre-existing file too.
        set_owner_only(path)?;
        file.write_all(&self.0).map_err(|e| key_file_err(path, e))?;
        file.sync_all().map_err(|e| key_file_err(path, e))?;
        Ok(())
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(<redacted>)")
    }
}

fn key_file_err(path: &Path, source: std::io::Error) -> SealError {
    SealError::KeyFile {
        path: PathBuf::from(path),
        source,
    }
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> Result<(), SealError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| key_file_err(path, e))
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> Result<(), SealError> {
    Ok(())
}
