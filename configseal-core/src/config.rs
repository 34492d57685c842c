//! Sync configuration.
//!
//! A [`SyncConfig`] is built once at startup and passed by reference into the
//! engine. Values come from two layers, both expressed as
//! [`SyncConfigOverrides`]:
//!
//! 1. an optional YAML file (`--config`), e.g.
//!
//!    ```yaml
//!    url: https://config.internal/app.bundle
//!    keyfile: /etc/configseal/app.key
//!    target: /etc/app
//!    reload: systemctl reload app
//!    fetch_timeout_secs: 30
//!    ```
//!
//! 2. command-line flags, which win over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default overall deadline for fetching a bundle.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default cap on the size of a fetched bundle (256 MiB).
pub const DEFAULT_MAX_BUNDLE_BYTES: u64 = 256 * 1024 * 1024;

/// Fully resolved, immutable settings for one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Where to fetch the sealed bundle from (`https://`, `http://`, `file://` or a path).
    pub url: String,
    /// File holding the 32-byte key.
    pub keyfile: PathBuf,
    /// Directory the bundle's files are synced into.
    pub target: PathBuf,
    /// Shell command run once after changes were applied.
    pub reload: Option<String>,
    pub fetch_timeout: Duration,
    pub max_bundle_bytes: u64,
    /// Decrypt and diff only; never rename or reload.
    pub dry_run: bool,
}

/// One layer of partially specified settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfigOverrides {
    pub url: Option<String>,
    pub keyfile: Option<PathBuf>,
    pub target: Option<PathBuf>,
    pub reload: Option<String>,
    pub fetch_timeout_secs: Option<u64>,
    pub max_bundle_bytes: Option<u64>,
    #[serde(skip)]
    pub dry_run: bool,
}

impl SyncConfigOverrides {
    /// Load a layer from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Layer `other` on top of `self`; any value set in `other` wins.
    pub fn merge(self, other: Self) -> Self {
        Self {
            url: other.url.or(self.url),
            keyfile: other.keyfile.or(self.keyfile),
            target: other.target.or(self.target),
            reload: other.reload.or(self.reload),
            fetch_timeout_secs: other.fetch_timeout_secs.or(self.fetch_timeout_secs),
            max_bundle_bytes: other.max_bundle_bytes.or(self.max_bundle_bytes),
            dry_run: self.dry_run || other.dry_run,
        }
    }
}

impl SyncConfig {
    /// Resolve a merged layer into a validated config, filling in defaults.
    pub fn resolve(layer: SyncConfigOverrides) -> Result<Self, ConfigError> {
        let url = layer
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::Missing("url"))?;
        let keyfile = layer.keyfile.ok_or(ConfigError::Missing("keyfile"))?;

        let timeout_secs = layer
            .fetch_timeout_secs
            .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "fetch_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        let max_bundle_bytes = layer.max_bundle_bytes.unwrap_or(DEFAULT_MAX_BUNDLE_BYTES);
        if max_bundle_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_bundle_bytes",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            url,
            keyfile,
            target: layer.target.unwrap_or_else(|| PathBuf::from(".")),
            reload: layer.reload.filter(|c| !c.trim().is_empty()),
            fetch_timeout: Duration::from_secs(timeout_secs),
            max_bundle_bytes,
            dry_run: layer.dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn minimal() -> SyncConfigOverrides {
        SyncConfigOverrides {
            url: Some("https://example.test/app.bundle".to_string()),
            keyfile: Some(PathBuf::from("/etc/configseal/app.key")),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_are_applied() {
        let cfg = SyncConfig::resolve(minimal()).unwrap();
        assert_eq!(cfg.target, PathBuf::from("."));
        assert_eq!(cfg.reload, None);
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS));
        assert_eq!(cfg.max_bundle_bytes, DEFAULT_MAX_BUNDLE_BYTES);
        assert!(!cfg.dry_run);
    }

    #[test]
    fn missing_url_is_reported() {
        let layer = SyncConfigOverrides {
            url: None,
            ..minimal()
        };
        let err = SyncConfig::resolve(layer).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("url")));
    }

    #[test]
    fn missing_keyfile_is_reported() {
        let layer = SyncConfigOverrides {
            keyfile: None,
            ..minimal()
        };
        assert!(matches!(
            SyncConfig::resolve(layer),
            Err(ConfigError::Missing("keyfile"))
        ));
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let layer = SyncConfigOverrides {
            fetch_timeout_secs: Some(0),
            ..minimal()
        };
        assert!(matches!(
            SyncConfig::resolve(layer),
            Err(ConfigError::Invalid { field: "fetch_timeout_secs", .. })
        ));
    }

    #[test]
    fn blank_reload_means_none() {
        let layer = SyncConfigOverrides {
            reload: Some("   ".to_string()),
            ..minimal()
        };
        assert_eq!(SyncConfig::resolve(layer).unwrap().reload, None);
    }

    #[test]
    fn flags_override_file_values() {
        let file = SyncConfigOverrides {
            target: Some(PathBuf::from("/etc/app")),
            reload: Some("systemctl reload app".to_string()),
            ..minimal()
        };
        let flags = SyncConfigOverrides {
            target: Some(PathBuf::from("/srv/app")),
            dry_run: true,
            ..Default::default()
        };
        let cfg = SyncConfig::resolve(file.merge(flags)).unwrap();
        assert_eq!(cfg.target, PathBuf::from("/srv/app"));
        assert_eq!(cfg.reload.as_deref(), Some("systemctl reload app"));
        assert_eq!(cfg.url, "https://example.test/app.bundle");
        assert!(cfg.dry_run);
    }

    #[test]
    fn loads_yaml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sync.yaml");
        std::fs::write(
            &path,
            "url: file:///var/lib/app.bundle\nkeyfile: /etc/app.key\nfetch_timeout_secs: 5\n",
        )
        .unwrap();

        let layer = SyncConfigOverrides::load(&path).unwrap();
        let cfg = SyncConfig::resolve(layer).unwrap();
        assert_eq!(cfg.url, "file:///var/lib/app.bundle");
        assert_eq!(cfg.keyfile, PathBuf::from("/etc/app.key"));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(5));
    }

    #[test]
    fn unknown_yaml_field_is_a_parse_error_with_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sync.yaml");
        std::fs::write(&path, "url: x\nkey_file: /typo\n").unwrap();

        let err = SyncConfigOverrides::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("sync.yaml"));
    }
}
