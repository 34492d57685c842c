//! Error types for configseal-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from key handling and the sealed-bundle codec.
#[derive(Debug, Error)]
pub enum SealError {
    /// Key material was not exactly [`crate::key::KEY_LEN`] bytes.
    #[error("key must be exactly 32 bytes, got {len}")]
    InvalidKey { len: usize },

    /// Key file could not be read or written.
    #[error("key file I/O error at {path}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The OS random source failed; nothing was sealed.
    #[error("secure randomness unavailable: {0}")]
    Randomness(String),

    /// The cipher rejected the payload (beyond its length limit).
    #[error("encryption failed")]
    Encryption,

    /// Input too short to hold a nonce and an authentication tag.
    #[error("sealed bundle truncated: {len} bytes is shorter than nonce + tag")]
    Truncated { len: usize },

    /// Tag did not verify: corrupted transport, wrong key, or tampering.
    #[error("bundle authentication failed (wrong key or corrupted/tampered data)")]
    Authentication,
}

/// Errors from loading or validating a [`crate::SyncConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, with file path and serde_yaml's line context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A required setting was absent after merging file and flags.
    #[error("missing required setting '{0}'")]
    Missing(&'static str),

    /// A setting was present but unusable.
    #[error("invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}
