//! Core services for promptlib-mcp.
//!
//! This crate mirrors a remote prompt catalog into a bounded-staleness
//! metadata cache, resolves catalog entries to content through signed URLs,
//! and projects the current snapshot into the tool surface served to hosts.

pub mod cache;
pub mod catalog;
pub mod client;
pub mod error;
pub mod registry;
pub mod resolver;

pub use cache::{CacheConfig, MetadataCache};
pub use client::{CatalogSource, HttpCatalogClient, HttpCatalogConfig};
pub use error::CatalogError;
pub use registry::{FixedOperation, OperationOutput, ToolDescriptor, ToolRegistry, ToolTarget};
pub use resolver::{ContentResolver, ContentResult};
