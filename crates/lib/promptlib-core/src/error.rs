use std::{error::Error, fmt};

/// Classified failure returned by every catalog operation.
///
/// `Clone` so a single refresh outcome can be handed to every caller waiting
/// on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    Timeout {
        target: String,
        document: Option<String>,
    },
    Unreachable {
        target: String,
        document: Option<String>,
        message: String,
    },
    Malformed(String),
    NotFound(String),
    ExpiredOrInvalidUrl {
        document: Option<String>,
        status: u16,
    },
    UnknownOperation(String),
    RegistryConflict {
        name: String,
        existing: String,
        incoming: String,
    },
    InvalidArguments(String),
}

impl CatalogError {
    /// Stable snake_case label for structured error payloads.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Unreachable { .. } => "unreachable",
            Self::Malformed(_) => "malformed",
            Self::NotFound(_) => "not_found",
            Self::ExpiredOrInvalidUrl { .. } => "expired_or_invalid_url",
            Self::UnknownOperation(_) => "unknown_operation",
            Self::RegistryConflict { .. } => "registry_conflict",
            Self::InvalidArguments(_) => "invalid_arguments",
        }
    }

    /// Attaches the document identifier to network and URL failures.
    #[must_use]
    pub fn for_document(self, id: &str) -> Self {
        match self {
            Self::Timeout { target, .. } => Self::Timeout {
                target,
                document: Some(id.to_string()),
            },
            Self::Unreachable {
                target, message, ..
            } => Self::Unreachable {
                target,
                document: Some(id.to_string()),
                message,
            },
            Self::ExpiredOrInvalidUrl { status, .. } => Self::ExpiredOrInvalidUrl {
                document: Some(id.to_string()),
                status,
            },
            other => other,
        }
    }

    /// Identifier the failure relates to, when known.
    #[must_use]
    pub fn document(&self) -> Option<&str> {
        match self {
            Self::Timeout { document, .. }
            | Self::Unreachable { document, .. }
            | Self::ExpiredOrInvalidUrl { document, .. } => document.as_deref(),
            Self::NotFound(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout {
                target,
                document: Some(document),
            } => write!(f, "request to {target} for {document} timed out"),
            Self::Timeout { target, .. } => write!(f, "request to {target} timed out"),
            Self::Unreachable {
                target,
                document: Some(document),
                message,
            } => write!(f, "{target} unreachable while fetching {document}: {message}"),
            Self::Unreachable {
                target, message, ..
            } => write!(f, "{target} unreachable: {message}"),
            Self::Malformed(message) => write!(f, "malformed catalog response: {message}"),
            Self::NotFound(id) => write!(f, "prompt '{id}' not found"),
            Self::ExpiredOrInvalidUrl {
                document: Some(document),
                status,
            } => write!(
                f,
                "signed URL for {document} was rejected with status {status}; refresh the prompt cache"
            ),
            Self::ExpiredOrInvalidUrl { status, .. } => {
                write!(f, "signed URL was rejected with status {status}")
            }
            Self::UnknownOperation(name) => write!(f, "unknown operation: {name}"),
            Self::RegistryConflict {
                name,
                existing,
                incoming,
            } => write!(
                f,
                "operation name {name} is derived from both {existing} and {incoming}"
            ),
            Self::InvalidArguments(message) => write!(f, "invalid arguments: {message}"),
        }
    }
}

impl Error for CatalogError {}
