//! Shared sync pipeline entrypoints used by the CLI.

use configseal_core::{seal, Key, SyncConfig};

use crate::engine::{sync_bundle, SyncOptions, SyncReport};
use crate::error::SyncError;
use crate::fetch::{fetch, FetchOptions};

/// Run one full sync: load key → fetch → decrypt → diff/apply → reload.
///
/// The key is loaded before anything is fetched so a bad key file fails fast.
pub fn run(config: &SyncConfig) -> Result<SyncReport, SyncError> {
    let key = Key::load(&config.keyfile)?;
    let sealed = fetch(&config.url, &FetchOptions::from_config(config))?;
    sync_bundle(&sealed, &key, &SyncOptions::from_config(config))
}

/// Fetch and open a bundle, returning the decrypted tar payload.
pub fn unseal(url: &str, key: &Key, options: &FetchOptions) -> Result<Vec<u8>, SyncError> {
    let sealed = fetch(url, options)?;
    Ok(seal::open(key, &sealed)?)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use configseal_core::SyncConfigOverrides;
    use tempfile::TempDir;

    use super::*;
    use crate::test_support::TarFixture;

    fn write_bundle(dir: &TempDir, key: &Key, payload: &[u8]) -> PathBuf {
        let path = dir.path().join("app.bundle");
        std::fs::write(&path, seal::seal(key, payload).unwrap()).unwrap();
        path
    }

    #[test]
    fn run_syncs_from_file_url() {
        let origin = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        let key = Key::generate().unwrap();
        let keyfile = origin.path().join("app.key");
        key.write_to(&keyfile, false).unwrap();
        let payload = TarFixture::new().file("app.conf", b"A=1\n", 0o644, 1).finish();
        let bundle = write_bundle(&origin, &key, &payload);

        let config = SyncConfig::resolve(SyncConfigOverrides {
            url: Some(format!("file://{}", bundle.display())),
            keyfile: Some(keyfile),
            target: Some(target.path().to_path_buf()),
            ..Default::default()
        })
        .unwrap();

        let report = run(&config).unwrap();
        assert_eq!(report.changed(), 1);
        assert_eq!(std::fs::read(target.path().join("app.conf")).unwrap(), b"A=1\n");
    }

    #[test]
    fn bad_key_file_fails_before_fetch() {
        let origin = TempDir::new().unwrap();
        let keyfile = origin.path().join("short.key");
        std::fs::write(&keyfile, [0u8; 16]).unwrap();

        let config = SyncConfig::resolve(SyncConfigOverrides {
            url: Some("https://unreachable.invalid/app.bundle".to_string()),
            keyfile: Some(keyfile),
            ..Default::default()
        })
        .unwrap();

        let err = run(&config).unwrap_err();
        assert_eq!(err.kind(), "InvalidKey");
    }

    #[test]
    fn unseal_returns_plaintext() {
        let origin = TempDir::new().unwrap();
        let key = Key::generate().unwrap();
        let bundle = write_bundle(&origin, &key, b"raw tar bytes");

        let opts = FetchOptions {
            timeout: Duration::from_secs(5),
            max_bytes: 1 << 20,
        };
        let plain = unseal(&bundle.to_string_lossy(), &key, &opts).unwrap();
        assert_eq!(plain, b"raw tar bytes");
    }
}
