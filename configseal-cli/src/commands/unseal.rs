//! `configseal unseal`: fetch and decrypt a bundle for inspection.

use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use configseal_core::config::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_MAX_BUNDLE_BYTES};
use configseal_core::Key;
use configseal_sync::{archive, pipeline, FetchOptions};

/// Arguments for `configseal unseal`.
#[derive(Args, Debug)]
pub struct UnsealArgs {
    /// URL of the sealed bundle.
    #[arg(long, short = 'u')]
    pub url: String,

    /// Path to the file holding the 32-byte key.
    #[arg(long, short = 'k')]
    pub keyfile: PathBuf,

    /// Print a table of the bundle's files instead of the raw tar.
    #[arg(long)]
    pub list: bool,

    /// With --list, emit JSON.
    #[arg(long, requires = "list")]
    pub json: bool,

    /// Overall fetch deadline in seconds.
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub timeout: u64,
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "file")]
    name: String,
    #[tabled(rename = "mode")]
    mode: String,
    #[tabled(rename = "size")]
    size: u64,
    #[tabled(rename = "modified")]
    modified: String,
}

impl UnsealArgs {
    pub fn run(self) -> Result<()> {
        let key = Key::load(&self.keyfile)
            .with_context(|| format!("failed to read key from '{}'", self.keyfile.display()))?;
        let options = FetchOptions {
            timeout: Duration::from_secs(self.timeout),
            max_bytes: DEFAULT_MAX_BUNDLE_BYTES,
        };
        let payload = pipeline::unseal(&self.url, &key, &options)
            .with_context(|| format!("failed to unseal {}", self.url))?;

        if !self.list {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&payload).context("failed to write to stdout")?;
            stdout.flush()?;
            return Ok(());
        }

        let entries = archive::list(Cursor::new(payload)).context("failed to read bundle")?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }

        let rows: Vec<EntryRow> = entries
            .into_iter()
            .map(|e| EntryRow {
                name: e.name.display().to_string(),
                mode: format!("{:04o}", e.mode),
                size: e.size,
                modified: DateTime::<Utc>::from_timestamp(e.mtime, 0)
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| e.mtime.to_string()),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
