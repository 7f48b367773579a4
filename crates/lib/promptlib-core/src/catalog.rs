//! Search and describe handlers over a catalog snapshot.
//!
//! Everything here is pure: the functions only read the snapshot they are
//! given and never touch the network or the cache.

use promptlib_store::schema::file_stem;
use promptlib_store::{CatalogSnapshot, Category, DocumentMetadata};

use crate::error::CatalogError;

/// Ordered categorization rules, matched against the lowercased identifier.
/// The first rule with a matching substring wins.
pub const CATEGORY_RULES: &[(&str, Category)] = &[
    ("test", Category::Testing),
    ("ui", Category::Frontend),
    ("frontend", Category::Frontend),
    ("fes", Category::Frontend),
    ("be", Category::Backend),
    ("backend", Category::Backend),
    ("api", Category::Api),
];

pub const DEFAULT_CATEGORY: Category = Category::General;

/// Returns every document in listing order.
#[must_use]
pub fn list_all(snapshot: &CatalogSnapshot) -> &[DocumentMetadata] {
    snapshot.documents()
}

/// Finds a document by identifier, ignoring ASCII case.
///
/// An exact match is preferred over a case-insensitive one.
///
/// # Errors
/// Returns `CatalogError::NotFound` if no identifier matches.
pub fn find_by_name<'a>(
    snapshot: &'a CatalogSnapshot,
    name: &str,
) -> Result<&'a DocumentMetadata, CatalogError> {
    let name = name.trim();
    snapshot
        .get(name)
        .or_else(|| {
            snapshot
                .documents()
                .iter()
                .find(|document| document.file_name.eq_ignore_ascii_case(name))
        })
        .ok_or_else(|| CatalogError::NotFound(name.to_string()))
}

/// Case-insensitive substring search over identifiers.
///
/// An empty keyword matches every document, in listing order.
#[must_use]
pub fn search<'a>(snapshot: &'a CatalogSnapshot, keyword: &str) -> Vec<&'a DocumentMetadata> {
    let needle = keyword.to_lowercase();
    snapshot
        .documents()
        .iter()
        .filter(|document| document.file_name.to_lowercase().contains(&needle))
        .collect()
}

/// Category for a raw identifier.
#[must_use]
pub fn category_for(file_name: &str) -> Category {
    let lowered = file_name.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map_or(DEFAULT_CATEGORY, |(_, category)| *category)
}

#[must_use]
pub fn categorize(document: &DocumentMetadata) -> Category {
    category_for(&document.file_name)
}

/// Human-readable description used for derived operations and listings.
#[must_use]
pub fn describe(document: &DocumentMetadata) -> String {
    format!(
        "Get {} prompt for {}. Size: {} bytes. Last updated: {}",
        title_case(file_stem(&document.file_name)),
        document.category,
        document.size,
        document.updated.format("%Y-%m-%d"),
    )
}

fn title_case(stem: &str) -> String {
    stem.split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
