//! Daemon entry point for the prompt library MCP server.
//!
//! Loads configuration from the CLI and environment, builds the catalog
//! registry, and serves MCP over stdio and/or streamable HTTP.

mod config;
mod registry;

use promptlib_mcp::PromptLibMcp;
use promptlib_mcp::server::{McpHttpServerConfig, serve_stdio, serve_streamable_http};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::PromptLibConfig;
use crate::registry::build_registry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = PromptLibConfig::from_args()?;
    init_tracing(&config.log_filter);

    let registry = build_registry(&config)?;
    let server = PromptLibMcp::new(registry).with_api_endpoint(config.api_url.as_str());
    info!(
        api_url = %config.api_url,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        request_timeout_secs = config.request_timeout.as_secs(),
        "starting promptlib-mcpd"
    );

    let http = config.mcp_serve.then(|| {
        let server = server.clone();
        let http_config = McpHttpServerConfig::new(config.mcp_http_addr);
        tokio::spawn(async move {
            if let Err(err) = serve_streamable_http(server, http_config).await {
                error!(error = %err, "MCP HTTP server stopped");
            }
        })
    });

    if config.enable_stdio {
        serve_stdio(server).await?;
        if let Some(http) = http {
            http.abort();
        }
    } else if let Some(http) = http {
        http.await?;
    }
    Ok(())
}

/// Logs go to stderr; stdout belongs to the stdio transport.
fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
