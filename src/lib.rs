//! schemactl: GraphQL schema registry CLI and check core.
//!
//! The crate splits into:
//! - [`output`]: the result envelope protocol and the text builder every
//!   command renders through.
//! - [`cli`]: argument parsing and the command implementations.
//! - [`registry`]: the HTTP client and wire types for the registry API.
//! - [`schema`]: schema change records, document validation, rendering.
//! - [`usage`]: usage analytics contracts and the reclassification of
//!   breaking changes that no live traffic exercises.
//! - [`manifest`]: persisted-operations manifests and hash verification.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod registry;
pub mod schema;
pub mod usage;
