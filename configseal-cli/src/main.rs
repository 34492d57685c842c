//! configseal: sealed configuration bundle tooling.
//!
//! # Usage
//!
//! ```text
//! configseal keygen <keyfile> [--force]
//! configseal bundle -k <keyfile> -o <bundle> <inputs>...
//! configseal sync -u <url> -k <keyfile> [-t <dir>] [-c <reload-cmd>] [--config <yaml>] [--dry-run] [--json]
//! configseal unseal -u <url> -k <keyfile> [--list] [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{bundle::BundleArgs, keygen::KeygenArgs, sync::SyncArgs, unseal::UnsealArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "configseal",
    version,
    about = "Distribute sealed configuration bundles and keep hosts in sync",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch a sealed bundle and sync its files into a target directory.
    Sync(SyncArgs),

    /// Archive files and seal them into a bundle.
    Bundle(BundleArgs),

    /// Generate a new 32-byte key file.
    Keygen(KeygenArgs),

    /// Fetch and decrypt a bundle to stdout (raw tar), or list its entries.
    Unseal(UnsealArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Bundle(args) => args.run(),
        Commands::Keygen(args) => args.run(),
        Commands::Unseal(args) => args.run(),
    }
}

/// Logs go to stderr so stdout stays clean for `unseal` and `--json`.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
