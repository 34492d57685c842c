//! `configseal bundle -k <keyfile> -o <bundle> <inputs>...`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use configseal_core::Key;
use configseal_sync::create_bundle;

/// Archive files and seal them into a bundle.
#[derive(Args, Debug)]
pub struct BundleArgs {
    /// Path to the file holding the 32-byte key.
    #[arg(long, short = 'k')]
    pub keyfile: PathBuf,

    /// Output bundle path (written via `<out>.tmp` + rename).
    #[arg(long, short = 'o')]
    pub outfile: PathBuf,

    /// Files or directories to include; symlinks are followed.
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,
}

impl BundleArgs {
    pub fn run(self) -> Result<()> {
        let key = Key::load(&self.keyfile)
            .with_context(|| format!("failed to read key from '{}'", self.keyfile.display()))?;
        let written = create_bundle(&key, &self.outfile, &self.inputs)
            .with_context(|| format!("failed to build '{}'", self.outfile.display()))?;
        println!(
            "✓ Sealed {} input(s) into {} ({written} bytes)",
            self.inputs.len(),
            self.outfile.display()
        );
        Ok(())
    }
}
