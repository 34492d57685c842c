//! `configseal sync`: fetch, decrypt and apply a sealed bundle.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use configseal_core::{SyncConfig, SyncConfigOverrides};
use configseal_sync::{pipeline, SyncReport, WriteResult};

/// Arguments for `configseal sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// URL of the sealed bundle (https://, http://, file:// or a local path).
    #[arg(long, short = 'u')]
    pub url: Option<String>,

    /// Path to the file holding the 32-byte key.
    #[arg(long, short = 'k')]
    pub keyfile: Option<PathBuf>,

    /// Directory to sync the bundle's files into (default: current directory).
    #[arg(long, short = 't')]
    pub target: Option<PathBuf>,

    /// Shell command run once after files changed.
    #[arg(long = "exec", short = 'c', value_name = "COMMAND")]
    pub reload: Option<String>,

    /// YAML file with defaults for any of the above; flags win.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Overall fetch deadline in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Refuse bundles larger than this many bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_bundle_bytes: Option<u64>,

    /// Show what would be written without replacing files or reloading.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the sync report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config = self.resolve_config()?;
        let report = pipeline::run(&config).with_context(|| {
            format!(
                "sync of {} into '{}' failed",
                config.url,
                config.target.display()
            )
        })?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report);
        }
        Ok(())
    }

    fn resolve_config(&self) -> Result<SyncConfig> {
        let file_layer = match &self.config {
            Some(path) => SyncConfigOverrides::load(path)?,
            None => SyncConfigOverrides::default(),
        };
        let flags = SyncConfigOverrides {
            url: self.url.clone(),
            keyfile: self.keyfile.clone(),
            target: self.target.clone(),
            reload: self.reload.clone(),
            fetch_timeout_secs: self.timeout,
            max_bundle_bytes: self.max_bundle_bytes,
            dry_run: self.dry_run,
        };
        SyncConfig::resolve(file_layer.merge(flags)).context("invalid sync configuration")
    }
}

fn print_report(report: &SyncReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };

    if report.is_noop() {
        println!("{prefix}No changes ({} unchanged)", report.unchanged());
        return;
    }

    println!(
        "{prefix}{} '{}' synced ({} written, {} unchanged)",
        "✓".green().bold(),
        report.target_dir.display(),
        report.changed(),
        report.unchanged()
    );

    for w in &report.writes {
        match w {
            WriteResult::Written { path } => println!("  ✎  {}", path.display()),
            WriteResult::WouldWrite { path } => println!("  ~  {}", path.display()),
            WriteResult::Unchanged { path } => println!("  ·  {}", path.display()),
        }
    }

    if report.reloaded {
        println!("  {} reload command ran", "↻".cyan());
    }
}
