use std::borrow::Cow;

use promptlib_core::CatalogError;
use rmcp::ErrorData;
use rmcp::model::ErrorCode;
use serde_json::{Map, Value};

pub(crate) fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData::new(code, message, None)
}

/// Maps a catalog failure onto a protocol error with a `{ kind, ... }` payload.
pub(crate) fn map_catalog_err(err: &CatalogError) -> ErrorData {
    let code = match err {
        CatalogError::NotFound(_) => ErrorCode::RESOURCE_NOT_FOUND,
        CatalogError::UnknownOperation(_) | CatalogError::InvalidArguments(_) => {
            ErrorCode::INVALID_PARAMS
        }
        _ => ErrorCode::INTERNAL_ERROR,
    };

    let mut data = Map::new();
    data.insert("kind".to_string(), Value::from(err.kind()));
    if let Some(document) = err.document() {
        data.insert("document".to_string(), Value::from(document));
    }
    match err {
        CatalogError::ExpiredOrInvalidUrl { status, .. } => {
            data.insert("status".to_string(), Value::from(*status));
            data.insert(
                "hint".to_string(),
                Value::from("call refresh_prompt_cache and retry"),
            );
        }
        CatalogError::RegistryConflict {
            name,
            existing,
            incoming,
        } => {
            data.insert("name".to_string(), Value::from(name.as_str()));
            data.insert(
                "identifiers".to_string(),
                Value::from(vec![existing.as_str(), incoming.as_str()]),
            );
        }
        _ => {}
    }

    ErrorData::new(code, err.to_string(), Some(Value::Object(data)))
}
