//! Projection of the catalog snapshot into a named tool surface.
//!
//! The registry owns no per-document state. It keeps one cached projection
//! (tool name to document identifier) keyed by snapshot version and rebuilds it
//! whenever the cache hands out a snapshot with a different version.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use promptlib_store::schema::{
    TOOL_GET_PROMPT_BY_NAME,
    TOOL_LIST_PROMPTS,
    TOOL_REFRESH_CACHE,
    TOOL_SEARCH_PROMPTS,
    make_tool_name,
};
use promptlib_store::{CatalogSnapshot, Category, DocumentMetadata};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::cache::MetadataCache;
use crate::catalog;
use crate::client::CatalogSource;
use crate::error::CatalogError;
use crate::resolver::{ContentResolver, ContentResult};

/// Tool arguments as delivered by the host.
pub type JsonObject = Map<String, Value>;

/// Discovery operations that exist regardless of catalog contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedOperation {
    ListPrompts,
    GetPromptByName,
    SearchPrompts,
    RefreshCache,
}

impl FixedOperation {
    pub const ALL: [Self; 4] = [
        Self::ListPrompts,
        Self::GetPromptByName,
        Self::SearchPrompts,
        Self::RefreshCache,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ListPrompts => TOOL_LIST_PROMPTS,
            Self::GetPromptByName => TOOL_GET_PROMPT_BY_NAME,
            Self::SearchPrompts => TOOL_SEARCH_PROMPTS,
            Self::RefreshCache => TOOL_REFRESH_CACHE,
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ListPrompts => "List all available prompts from the API with their metadata.",
            Self::GetPromptByName => {
                "Describe a prompt by file name (case-insensitive) and name the tool that returns its content."
            }
            Self::SearchPrompts => {
                "Search prompts by keyword in file names (case-insensitive). An empty keyword lists every prompt."
            }
            Self::RefreshCache => {
                "Force refresh the prompt cache to get the latest prompts and signed URLs from the API."
            }
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|operation| operation.name() == name)
    }
}

/// What a published tool name dispatches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolTarget {
    Fixed(FixedOperation),
    Document(String),
}

/// One entry of the published tool surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub target: ToolTarget,
}

impl ToolDescriptor {
    fn fixed(operation: FixedOperation) -> Self {
        Self {
            name: operation.name().to_string(),
            description: operation.description().to_string(),
            target: ToolTarget::Fixed(operation),
        }
    }

    fn derived(document: &DocumentMetadata) -> Self {
        Self {
            name: make_tool_name(&document.file_name),
            description: catalog::describe(document),
            target: ToolTarget::Document(document.file_name.clone()),
        }
    }
}

/// Catalog entry as reported by the discovery operations.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PromptSummary {
    pub file_name: String,
    pub tool_name: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub category: Category,
    pub description: String,
}

impl From<&DocumentMetadata> for PromptSummary {
    fn from(document: &DocumentMetadata) -> Self {
        Self {
            file_name: document.file_name.clone(),
            tool_name: make_tool_name(&document.file_name),
            size: document.size,
            content_type: document.content_type.clone(),
            updated: document.updated,
            expires_at: document.expires_at.clone(),
            category: document.category,
            description: catalog::describe(document),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CacheInfo {
    pub version: u64,
    pub captured_at: DateTime<Utc>,
    pub cache_age_secs: i64,
}

impl From<&CatalogSnapshot> for CacheInfo {
    fn from(snapshot: &CatalogSnapshot) -> Self {
        Self {
            version: snapshot.version,
            captured_at: snapshot.captured_at,
            cache_age_secs: (Utc::now() - snapshot.captured_at).num_seconds().max(0),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ListingReport {
    pub status: &'static str,
    pub total_prompts: usize,
    pub prompts: Vec<PromptSummary>,
    pub cache_info: CacheInfo,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DescribedPrompt {
    pub status: &'static str,
    #[serde(flatten)]
    pub prompt: PromptSummary,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SearchReport {
    pub status: &'static str,
    pub keyword: String,
    pub matches_found: usize,
    pub prompts: Vec<PromptSummary>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RefreshReport {
    pub status: &'static str,
    pub message: &'static str,
    pub total_prompts: usize,
    pub version: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContentMetadata {
    pub size: u64,
    pub updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub category: Category,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContentReport {
    pub status: &'static str,
    pub file_name: String,
    pub content: String,
    pub byte_length: usize,
    pub latency_ms: u64,
    pub metadata: ContentMetadata,
}

impl From<ContentResult> for ContentReport {
    fn from(result: ContentResult) -> Self {
        let ContentResult {
            document,
            content,
            byte_length,
            latency,
        } = result;
        Self {
            status: STATUS_SUCCESS,
            file_name: document.file_name,
            content,
            byte_length,
            latency_ms: u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            metadata: ContentMetadata {
                size: document.size,
                updated: document.updated,
                content_type: document.content_type,
                category: document.category,
            },
        }
    }
}

/// Result payload of a successful invocation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OperationOutput {
    Listing(ListingReport),
    Described(DescribedPrompt),
    Search(SearchReport),
    Refreshed(RefreshReport),
    Content(ContentReport),
}

const STATUS_SUCCESS: &str = "success";

#[derive(Debug, Deserialize)]
struct GetPromptByNameArgs {
    file_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPromptsArgs {
    #[serde(default)]
    keyword: String,
}

/// Derived operations for one snapshot version.
struct Projection {
    version: u64,
    derived: Result<DerivedOperations, CatalogError>,
}

struct DerivedOperations {
    descriptors: Vec<ToolDescriptor>,
    targets: HashMap<String, String>,
}

impl Projection {
    fn build(snapshot: &CatalogSnapshot) -> Self {
        Self {
            version: snapshot.version,
            derived: DerivedOperations::build(snapshot),
        }
    }
}

impl DerivedOperations {
    fn build(snapshot: &CatalogSnapshot) -> Result<Self, CatalogError> {
        let mut descriptors = Vec::with_capacity(snapshot.len());
        let mut targets: HashMap<String, String> = HashMap::with_capacity(snapshot.len());

        for document in snapshot.documents() {
            let descriptor = ToolDescriptor::derived(document);
            if let Some(fixed) = FixedOperation::from_name(&descriptor.name) {
                return Err(CatalogError::RegistryConflict {
                    name: descriptor.name,
                    existing: format!("fixed operation {}", fixed.name()),
                    incoming: document.file_name.clone(),
                });
            }
            if let Some(existing) = targets.get(&descriptor.name) {
                return Err(CatalogError::RegistryConflict {
                    name: descriptor.name,
                    existing: existing.clone(),
                    incoming: document.file_name.clone(),
                });
            }
            targets.insert(descriptor.name.clone(), document.file_name.clone());
            descriptors.push(descriptor);
        }

        Ok(Self {
            descriptors,
            targets,
        })
    }
}

/// Read-through tool registry over the metadata cache.
pub struct ToolRegistry<S: CatalogSource> {
    cache: MetadataCache<S>,
    resolver: ContentResolver<S>,
    projection: RwLock<Option<Arc<Projection>>>,
}

impl<S: CatalogSource> ToolRegistry<S> {
    #[must_use]
    pub fn new(cache: MetadataCache<S>) -> Self {
        let resolver = ContentResolver::new(cache.clone());
        Self {
            cache,
            resolver,
            projection: RwLock::new(None),
        }
    }

    #[must_use]
    pub const fn cache(&self) -> &MetadataCache<S> {
        &self.cache
    }

    #[must_use]
    pub const fn resolver(&self) -> &ContentResolver<S> {
        &self.resolver
    }

    /// Fixed operations followed by one derived operation per document.
    ///
    /// # Errors
    /// Returns the cache error if no snapshot can be obtained, or
    /// `RegistryConflict` if two documents derive the same operation name.
    pub async fn list_operations(&self) -> Result<Vec<ToolDescriptor>, CatalogError> {
        let snapshot = self.cache.get_snapshot(false).await?;
        let projection = self.projection_for(&snapshot).await;
        let derived = projection.derived.as_ref().map_err(Clone::clone)?;

        let mut operations: Vec<ToolDescriptor> = FixedOperation::ALL
            .into_iter()
            .map(ToolDescriptor::fixed)
            .collect();
        operations.extend(derived.descriptors.iter().cloned());
        Ok(operations)
    }

    /// Dispatches an operation by name.
    ///
    /// # Errors
    /// Returns `UnknownOperation` for names outside the published surface and
    /// otherwise the classified failure of the operation.
    pub async fn invoke(
        &self,
        name: &str,
        args: &JsonObject,
    ) -> Result<OperationOutput, CatalogError> {
        if let Some(operation) = FixedOperation::from_name(name) {
            return self.invoke_fixed(operation, args).await;
        }

        let snapshot = self.cache.get_snapshot(false).await?;
        let projection = self.projection_for(&snapshot).await;
        let derived = projection.derived.as_ref().map_err(Clone::clone)?;
        let Some(id) = derived.targets.get(name) else {
            return Err(CatalogError::UnknownOperation(name.to_string()));
        };

        let content = self.resolver.fetch(id).await?;
        Ok(OperationOutput::Content(content.into()))
    }

    /// Snapshot version the cached projection was built from, if any.
    pub async fn projection_version(&self) -> Option<u64> {
        self.projection
            .read()
            .await
            .as_ref()
            .map(|projection| projection.version)
    }

    async fn invoke_fixed(
        &self,
        operation: FixedOperation,
        args: &JsonObject,
    ) -> Result<OperationOutput, CatalogError> {
        match operation {
            FixedOperation::ListPrompts => {
                let snapshot = self.cache.get_snapshot(false).await?;
                let prompts: Vec<PromptSummary> = catalog::list_all(&snapshot)
                    .iter()
                    .map(PromptSummary::from)
                    .collect();
                Ok(OperationOutput::Listing(ListingReport {
                    status: STATUS_SUCCESS,
                    total_prompts: prompts.len(),
                    prompts,
                    cache_info: CacheInfo::from(snapshot.as_ref()),
                }))
            }
            FixedOperation::GetPromptByName => {
                let args: GetPromptByNameArgs = decode_args(args)?;
                let snapshot = self.cache.get_snapshot(false).await?;
                let document = catalog::find_by_name(&snapshot, &args.file_name)?;
                Ok(OperationOutput::Described(DescribedPrompt {
                    status: STATUS_SUCCESS,
                    prompt: PromptSummary::from(document),
                }))
            }
            FixedOperation::SearchPrompts => {
                let args: SearchPromptsArgs = decode_args(args)?;
                let snapshot = self.cache.get_snapshot(false).await?;
                let prompts: Vec<PromptSummary> = catalog::search(&snapshot, &args.keyword)
                    .into_iter()
                    .map(PromptSummary::from)
                    .collect();
                Ok(OperationOutput::Search(SearchReport {
                    status: STATUS_SUCCESS,
                    keyword: args.keyword,
                    matches_found: prompts.len(),
                    prompts,
                }))
            }
            FixedOperation::RefreshCache => {
                let snapshot = self.cache.get_snapshot(true).await?;
                Ok(OperationOutput::Refreshed(RefreshReport {
                    status: STATUS_SUCCESS,
                    message: "Cache refreshed successfully",
                    total_prompts: snapshot.len(),
                    version: snapshot.version,
                    timestamp: snapshot.captured_at,
                }))
            }
        }
    }

    async fn projection_for(&self, snapshot: &CatalogSnapshot) -> Arc<Projection> {
        {
            let current = self.projection.read().await;
            if let Some(projection) = current
                .as_ref()
                .filter(|projection| projection.version == snapshot.version)
            {
                return projection.clone();
            }
        }

        let mut current = self.projection.write().await;
        if let Some(projection) = current
            .as_ref()
            .filter(|projection| projection.version == snapshot.version)
        {
            return projection.clone();
        }

        let projection = Arc::new(Projection::build(snapshot));
        match &projection.derived {
            Ok(derived) => debug!(
                version = projection.version,
                derived = derived.descriptors.len(),
                "rebuilt tool projection"
            ),
            Err(err) => error!(
                version = projection.version,
                error = %err,
                "refusing to publish derived operations"
            ),
        }
        if current
            .as_ref()
            .is_none_or(|held| held.version <= snapshot.version)
        {
            *current = Some(projection.clone());
        }
        projection
    }
}

fn decode_args<T: DeserializeOwned>(args: &JsonObject) -> Result<T, CatalogError> {
    serde_json::from_value(Value::Object(args.clone()))
        .map_err(|err| CatalogError::InvalidArguments(err.to_string()))
}
