//! Resolution of catalog entries to their current content.

use std::sync::Arc;
use std::time::{Duration, Instant};

use promptlib_store::DocumentMetadata;
use tracing::{debug, warn};

use crate::cache::MetadataCache;
use crate::client::CatalogSource;
use crate::error::CatalogError;

/// Fetched document body. Never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentResult {
    pub document: DocumentMetadata,
    pub content: String,
    pub byte_length: usize,
    pub latency: Duration,
}

/// Resolves catalog identifiers to their current content.
pub struct ContentResolver<S: CatalogSource> {
    cache: MetadataCache<S>,
    source: Arc<S>,
}

impl<S: CatalogSource> Clone for ContentResolver<S> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            source: self.source.clone(),
        }
    }
}

impl<S: CatalogSource> ContentResolver<S> {
    #[must_use]
    pub fn new(cache: MetadataCache<S>) -> Self {
        let source = cache.source();
        Self { cache, source }
    }

    /// Fetches the content of a document from the latest snapshot.
    ///
    /// # Errors
    /// Returns `NotFound` without touching the network when `id` is not in the
    /// snapshot, `ExpiredOrInvalidUrl` when storage rejects the signed URL, and
    /// the transport classification (annotated with `id`) otherwise.
    pub async fn fetch(&self, id: &str) -> Result<ContentResult, CatalogError> {
        let snapshot = self.cache.get_snapshot(false).await?;
        let document = snapshot
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

        let started = Instant::now();
        let outcome = self.fetch_document(&document).await;
        let latency = started.elapsed();

        match outcome {
            Ok(content) => {
                debug!(
                    document = id,
                    bytes = content.len(),
                    latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    "prompt content fetched"
                );
                Ok(ContentResult {
                    byte_length: content.len(),
                    document,
                    content,
                    latency,
                })
            }
            Err(err) => {
                warn!(document = id, kind = err.kind(), error = %err, "prompt content fetch failed");
                Err(err)
            }
        }
    }

    async fn fetch_document(&self, document: &DocumentMetadata) -> Result<String, CatalogError> {
        let id = document.file_name.as_str();
        let url = self
            .source
            .resolve_content_url(document)
            .await
            .map_err(|err| err.for_document(id))?;
        self.source
            .fetch_content(&url)
            .await
            .map_err(|err| err.for_document(id))
    }
}
