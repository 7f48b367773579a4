use chrono::{DateTime, Utc};
use promptlib_core::registry::PromptSummary;
use promptlib_store::CatalogSnapshot;
use promptlib_store::schema::METADATA_RESOURCE_URI;
use rmcp::model::{AnnotateAble, RawResource, Resource};
use serde::Serialize;

/// Body of the `prompt://metadata` resource.
#[derive(Debug, Serialize)]
pub(crate) struct MetadataDocument<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    api_endpoint: Option<&'a str>,
    cached_at: DateTime<Utc>,
    version: u64,
    total_prompts: usize,
    prompts: Vec<PromptSummary>,
}

impl<'a> MetadataDocument<'a> {
    pub(crate) fn new(snapshot: &CatalogSnapshot, api_endpoint: Option<&'a str>) -> Self {
        Self {
            api_endpoint,
            cached_at: snapshot.captured_at,
            version: snapshot.version,
            total_prompts: snapshot.len(),
            prompts: snapshot.documents().iter().map(PromptSummary::from).collect(),
        }
    }

    pub(crate) fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub(crate) fn metadata_resource() -> Resource {
    let mut resource = RawResource::new(METADATA_RESOURCE_URI, "Prompt catalog metadata");
    resource.description = Some("Cached catalog listing with prompt metadata.".to_string());
    resource.mime_type = Some("application/json".to_string());
    resource.no_annotation()
}
