//! MCP server implementation for promptlib-mcp.
//!
//! The tool surface is dynamic: it is recomputed from the current catalog
//! snapshot on every `tools/list`, so this crate implements `ServerHandler`
//! directly instead of through a static tool router.

mod helpers;
mod resources;
pub mod server;
pub mod tools;

use std::sync::Arc;

use promptlib_core::registry::JsonObject;
use promptlib_core::{CatalogSource, OperationOutput, ToolRegistry};
use promptlib_store::schema::METADATA_RESOURCE_URI;
use rmcp::model::{
    CallToolRequestParams,
    CallToolResult,
    Content,
    ErrorCode,
    ListResourcesResult,
    ListToolsResult,
    PaginatedRequestParams,
    ReadResourceRequestParams,
    ReadResourceResult,
    ResourceContents,
    ServerCapabilities,
    ServerInfo,
    Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler};
use tracing::{info, warn};

const SERVER_INSTRUCTIONS: &str = r"promptlib-mcp serves a remote library of prompt documents as MCP tools.

Workflow:
1. Call `list_available_prompts` to see every prompt with its size, category, and the tool that returns it.
2. Narrow the list with `search_prompts` (case-insensitive substring of the file name; empty keyword lists all).
3. Use `get_prompt_by_name` to describe one prompt and learn its content tool name.
4. Call the content tool (`get_<name>`, e.g. `get_fes_prompt` for `fes-prompt.txt`) to fetch the prompt text.

Notes:
- Content is fetched fresh on every call through a short-lived signed URL.
- Metadata is cached for a few minutes. Call `refresh_prompt_cache` after the library changes or when a
  content call fails with `expired_or_invalid_url`; the tool list is re-announced after a refresh.
- The `prompt://metadata` resource returns the cached catalog as JSON.";

/// MCP server wrapper around the tool registry.
pub struct PromptLibMcp<S: CatalogSource> {
    registry: Arc<ToolRegistry<S>>,
    api_endpoint: Option<Arc<str>>,
}

impl<S: CatalogSource> Clone for PromptLibMcp<S> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            api_endpoint: self.api_endpoint.clone(),
        }
    }
}

impl<S: CatalogSource> PromptLibMcp<S> {
    /// Creates a new server using a registry by value.
    #[must_use]
    pub fn new(registry: ToolRegistry<S>) -> Self {
        Self::with_registry(Arc::new(registry))
    }

    /// Creates a new server using a shared registry handle.
    #[must_use]
    pub const fn with_registry(registry: Arc<ToolRegistry<S>>) -> Self {
        Self {
            registry,
            api_endpoint: None,
        }
    }

    /// Records the listing endpoint reported by the metadata resource.
    #[must_use]
    pub fn with_api_endpoint(mut self, api_endpoint: impl Into<Arc<str>>) -> Self {
        self.api_endpoint = Some(api_endpoint.into());
        self
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<ToolRegistry<S>> {
        &self.registry
    }

    /// Current tool definitions.
    ///
    /// # Errors
    /// Returns the mapped catalog error when no snapshot is available or the
    /// derived names conflict.
    pub async fn tool_definitions(&self) -> Result<Vec<Tool>, ErrorData> {
        let operations = self
            .registry
            .list_operations()
            .await
            .map_err(|err| helpers::map_catalog_err(&err))?;
        Ok(operations.iter().map(tools::to_tool).collect())
    }

    /// Invokes a tool by name.
    ///
    /// # Errors
    /// Returns the mapped catalog error of the operation.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<OperationOutput, ErrorData> {
        let arguments = arguments.unwrap_or_default();
        self.registry
            .invoke(name, &arguments)
            .await
            .map_err(|err| helpers::map_catalog_err(&err))
    }

    /// JSON body of the `prompt://metadata` resource.
    ///
    /// # Errors
    /// Returns the mapped catalog error when no snapshot is available.
    pub async fn metadata_document(&self) -> Result<String, ErrorData> {
        let snapshot = self
            .registry
            .cache()
            .get_snapshot(false)
            .await
            .map_err(|err| helpers::map_catalog_err(&err))?;
        resources::MetadataDocument::new(&snapshot, self.api_endpoint.as_deref())
            .to_json()
            .map_err(|err| {
                helpers::mcp_err(
                    ErrorCode::INTERNAL_ERROR,
                    format!("failed to encode catalog metadata: {err}"),
                )
            })
    }
}

impl<S: CatalogSource> ServerHandler for PromptLibMcp<S> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_tool_list_changed()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tool_definitions().await?))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let before = self.registry.cache().cached().await.map(|snapshot| snapshot.version);
        let output = self.invoke(&request.name, request.arguments).await?;

        if refresh_rotated(before, &output) {
            info!("announcing refreshed tool list");
            if let Err(err) = context.peer.notify_tool_list_changed().await {
                warn!(error = %err, "failed to send tools/list_changed");
            }
        }
        Ok(CallToolResult::success(vec![Content::json(&output)?]))
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        Ok(ListResourcesResult::with_all_items(vec![
            resources::metadata_resource(),
        ]))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        if request.uri != METADATA_RESOURCE_URI {
            return Err(helpers::mcp_err(
                ErrorCode::RESOURCE_NOT_FOUND,
                format!("unknown resource: {}", request.uri),
            ));
        }
        let body = self.metadata_document().await?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(body, METADATA_RESOURCE_URI)],
        })
    }
}

/// Whether `output` is a refresh that installed a snapshot other than `before`.
fn refresh_rotated(before: Option<u64>, output: &OperationOutput) -> bool {
    matches!(output, OperationOutput::Refreshed(report) if before != Some(report.version))
}
