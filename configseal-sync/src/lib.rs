//! # configseal-sync
//!
//! Sealed-bundle sync engine and bundle creation.
//!
//! Call [`pipeline::run`] for a full fetch → decrypt → diff → apply → reload
//! cycle, or [`sync_bundle`] when the sealed bytes are already in hand.
//! [`create_bundle`] produces bundles for the origin side.

pub mod apply;
pub mod archive;
pub mod bundle;
pub mod differ;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod reload;
pub mod staging;

#[cfg(test)]
mod test_support;

pub use bundle::create_bundle;
pub use engine::{sync_bundle, sync_payload, SyncOptions, SyncReport, WriteResult};
pub use error::SyncError;
pub use fetch::FetchOptions;
