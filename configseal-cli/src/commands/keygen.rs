//! `configseal keygen <keyfile>`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use configseal_core::Key;

/// Generate a new random key file.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Where to write the key (created with mode 0600).
    pub keyfile: PathBuf,

    /// Replace an existing file.
    #[arg(long)]
    pub force: bool,
}

impl KeygenArgs {
    pub fn run(self) -> Result<()> {
        let key = Key::generate().context("failed to generate random key")?;
        key.write_to(&self.keyfile, self.force)
            .with_context(|| format!("failed to write key to '{}'", self.keyfile.display()))?;
        println!("✓ Wrote 32-byte key to {}", self.keyfile.display());
        Ok(())
    }
}
