use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Category label derived from a document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Testing,
    Frontend,
    Backend,
    Api,
    General,
}

impl Category {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Testing => "Testing & Quality Assurance",
            Self::Frontend => "Frontend Development",
            Self::Backend => "Backend Development",
            Self::Api => "API Development",
            Self::General => "General Development",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Where the signed content URL for a document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentLocator {
    /// The listing already carried a signed URL.
    Signed(String),
    /// A second call to this endpoint yields the signed URL.
    Endpoint(String),
}

/// Metadata for a single catalog document.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub file_name: String,
    pub size: u64,
    pub updated: DateTime<Utc>,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(skip)]
    pub locator: ContentLocator,
}

/// Immutable, versioned copy of the remote catalog.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CatalogSnapshot {
    pub version: u64,
    pub captured_at: DateTime<Utc>,
    documents: Vec<DocumentMetadata>,
}

impl CatalogSnapshot {
    #[must_use]
    pub const fn new(
        version: u64,
        captured_at: DateTime<Utc>,
        documents: Vec<DocumentMetadata>,
    ) -> Self {
        Self {
            version,
            captured_at,
            documents,
        }
    }

    /// Documents in listing order.
    #[must_use]
    pub fn documents(&self) -> &[DocumentMetadata] {
        &self.documents
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Exact identifier lookup.
    #[must_use]
    pub fn get(&self, file_name: &str) -> Option<&DocumentMetadata> {
        self.documents
            .iter()
            .find(|document| document.file_name == file_name)
    }

    #[must_use]
    pub fn contains(&self, file_name: &str) -> bool {
        self.get(file_name).is_some()
    }
}
