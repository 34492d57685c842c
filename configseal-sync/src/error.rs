//! Error types for configseal-sync.

use std::path::PathBuf;

use thiserror::Error;

use configseal_core::{ConfigError, SealError};

/// All errors that can abort a sync run.
///
/// Every variant is fatal: the run stops at the point of detection and
/// uncommitted staging files are removed by their guards.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Key loading, or bundle authentication / decryption.
    #[error("{0}")]
    Seal(#[from] SealError),

    /// Configuration could not be loaded or validated.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The bundle could not be fetched.
    #[error("failed to fetch {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The decrypted payload is not a well-formed tar stream.
    #[error("corrupt archive: {reason}")]
    CorruptArchive { reason: String },

    /// A filesystem operation failed, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rename failed after earlier renames had already succeeded.
    #[error(
        "rename onto {path} failed after {} file(s) were already replaced; \
         files may have been partially updated: {source}",
        applied.len()
    )]
    PartialApply {
        applied: Vec<PathBuf>,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The reload command could not be launched or exited non-zero.
    #[error("reload command `{command}` failed: {reason}")]
    Reload { command: String, reason: String },
}

impl SyncError {
    /// Taxonomy name of this failure, stable for logs and assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Seal(SealError::InvalidKey { .. }) => "InvalidKey",
            SyncError::Seal(SealError::Authentication | SealError::Truncated { .. }) => {
                "AuthenticationFailure"
            }
            SyncError::Seal(SealError::KeyFile { .. }) => "IOFailure",
            SyncError::Seal(SealError::Randomness(_) | SealError::Encryption) => "SealFailure",
            SyncError::Config(_) => "ConfigFailure",
            SyncError::Transport { .. } => "TransportFailure",
            SyncError::CorruptArchive { .. } => "CorruptArchive",
            SyncError::Io { .. } | SyncError::PartialApply { .. } => "IOFailure",
            SyncError::Reload { .. } => "ReloadFailure",
        }
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::CorruptArchive`].
pub(crate) fn corrupt(reason: impl Into<String>) -> SyncError {
    SyncError::CorruptArchive {
        reason: reason.into(),
    }
}
