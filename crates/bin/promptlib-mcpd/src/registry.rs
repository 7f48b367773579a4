use promptlib_core::{
    CacheConfig,
    HttpCatalogClient,
    HttpCatalogConfig,
    MetadataCache,
    ToolRegistry,
};

use crate::config::PromptLibConfig;

/// Builds the shared registry over the HTTP catalog client.
pub fn build_registry(
    config: &PromptLibConfig,
) -> Result<ToolRegistry<HttpCatalogClient>, reqwest::Error> {
    let client = HttpCatalogClient::new(
        HttpCatalogConfig::new(config.api_url.clone())
            .with_request_timeout(config.request_timeout),
    )?;
    let cache = MetadataCache::new(client, CacheConfig::new(config.cache_ttl));
    Ok(ToolRegistry::new(cache))
}
