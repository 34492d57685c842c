//! Bundle fetch: "bytes over a URL".
//!
//! `http://` and `https://` go through a `ureq` agent with an overall
//! deadline; `file://` URLs and bare paths read the local file. There is no
//! retry: any failure is a [`SyncError::Transport`] naming the URL.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use configseal_core::SyncConfig;

use crate::error::SyncError;

/// Limits applied to a single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub max_bytes: u64,
}

impl FetchOptions {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            timeout: config.fetch_timeout,
            max_bytes: config.max_bundle_bytes,
        }
    }
}

/// Fetch the raw sealed bundle at `url`.
pub fn fetch(url: &str, options: &FetchOptions) -> Result<Vec<u8>, SyncError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        fetch_http(url, options)
    } else if let Some(path) = url.strip_prefix("file://") {
        fetch_file(url, Path::new(path), options)
    } else if url.contains("://") {
        Err(transport(url, "unsupported URL scheme"))
    } else {
        fetch_file(url, Path::new(url), options)
    }
}

fn fetch_http(url: &str, options: &FetchOptions) -> Result<Vec<u8>, SyncError> {
    let agent = ureq::AgentBuilder::new().timeout(options.timeout).build();
    tracing::debug!("GET {url} (timeout {:?})", options.timeout);

    let response = agent.get(url).call().map_err(|e| match e {
        ureq::Error::Status(code, _) => transport(url, format!("HTTP status {code}")),
        ureq::Error::Transport(t) => transport(url, t.to_string()),
    })?;

    read_capped(url, response.into_reader(), options.max_bytes)
}

fn fetch_file(url: &str, path: &Path, options: &FetchOptions) -> Result<Vec<u8>, SyncError> {
    tracing::debug!("reading bundle from {}", path.display());
    let file = std::fs::File::open(path).map_err(|e| transport(url, e.to_string()))?;
    read_capped(url, file, options.max_bytes)
}

fn read_capped(url: &str, reader: impl Read, max_bytes: u64) -> Result<Vec<u8>, SyncError> {
    let mut body = Vec::new();
    reader
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut body)
        .map_err(|e| transport(url, format!("failed to read body: {e}")))?;
    if body.len() as u64 > max_bytes {
        return Err(transport(
            url,
            format!("bundle exceeds the {max_bytes}-byte limit"),
        ));
    }
    tracing::info!("fetched {} bytes from {url}", body.len());
    Ok(body)
}

fn transport(url: &str, reason: impl Into<String>) -> SyncError {
    SyncError::Transport {
        url: url.to_string(),
        reason: reason.into(),
    }
}
