//! Wire shapes returned by the prompt storage API.
//!
//! Fields are optional where the API has been observed to omit them; the
//! catalog client decides which omissions make a response malformed.

use serde::{Deserialize, Serialize};

/// Envelope returned by the listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<ListingEntry>>,
}

/// One document entry in the listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingEntry {
    pub file_name: String,
    pub size: u64,
    pub updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_url_endpoint: Option<String>,
}

/// Response from a signed URL endpoint.
///
/// The URL is accepted at the top level or nested under `data`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedUrlResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SignedUrlData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedUrlData {
    pub signed_url: String,
}

impl SignedUrlResponse {
    #[must_use]
    pub fn into_url(self) -> Option<String> {
        self.signed_url
            .or_else(|| self.data.map(|data| data.signed_url))
            .filter(|url| !url.trim().is_empty())
    }
}
