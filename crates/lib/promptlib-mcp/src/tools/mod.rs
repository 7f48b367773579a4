//! Conversion of registry descriptors into MCP tool definitions.
//!
//! The registry decides which tools exist; this module only attaches the
//! input schema each one accepts.

use std::sync::Arc;

use promptlib_core::{FixedOperation, ToolDescriptor, ToolTarget};
use rmcp::model::{JsonObject, Tool};
use rmcp::schemars;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameters for describing a prompt by file name.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetPromptByNameParams {
    /// Catalog file name, matched case-insensitively.
    pub file_name: String,
}

/// Parameters for searching prompts.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchPromptsParams {
    /// Substring matched against file names. Empty lists every prompt.
    #[serde(default)]
    pub keyword: String,
}

/// Operations that take no arguments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EmptyParams {}

/// Builds the MCP tool definition for a descriptor.
#[must_use]
pub fn to_tool(descriptor: &ToolDescriptor) -> Tool {
    let input_schema = match descriptor.target {
        ToolTarget::Fixed(FixedOperation::GetPromptByName) => schema_for::<GetPromptByNameParams>(),
        ToolTarget::Fixed(FixedOperation::SearchPrompts) => schema_for::<SearchPromptsParams>(),
        ToolTarget::Fixed(_) | ToolTarget::Document(_) => schema_for::<EmptyParams>(),
    };
    Tool::new(
        descriptor.name.clone(),
        descriptor.description.clone(),
        input_schema,
    )
}

fn schema_for<T: schemars::JsonSchema>() -> Arc<JsonObject> {
    let schema = schemars::schema_for!(T);
    match serde_json::to_value(&schema) {
        Ok(Value::Object(map)) => Arc::new(map),
        _ => Arc::new(JsonObject::new()),
    }
}
