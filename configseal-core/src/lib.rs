//! configseal core library: key material, sealed-bundle codec, configuration.
//!
//! Public API surface:
//! - [`key`]: the 32-byte pre-shared [`Key`] and key files
//! - [`seal`]: [`seal::seal`] / [`seal::open`] for the bundle wire format
//! - [`config`]: the immutable [`SyncConfig`] and its YAML loader
//! - [`error`]: [`SealError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod key;
pub mod seal;

pub use config::{SyncConfig, SyncConfigOverrides};
pub use error::{ConfigError, SealError};
pub use key::Key;
