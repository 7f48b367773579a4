//! Catalog models and naming helpers for promptlib-mcp.
//!
//! This crate defines the document metadata and snapshot types shared by the
//! catalog client, the metadata cache, and the tool registry, together with the
//! listing wire schema exposed by the remote prompt storage API.

pub mod models;
pub mod schema;
pub mod wire;

pub use models::*;
