//! Registry API collaborator: wire types and the HTTP client.

pub mod client;
pub mod types;

pub use client::{RegistryClient, clean_request_id};
pub use types::TargetRef;
