//! Outbound calls to the prompt storage API.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use promptlib_store::wire::{ListingEntry, ListingEnvelope, SignedUrlResponse};
use promptlib_store::{ContentLocator, DocumentMetadata};
use reqwest::{StatusCode, Url};
use tracing::debug;

use crate::catalog::category_for;
use crate::error::CatalogError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of catalog listings and document content.
///
/// Implementations perform exactly one attempt per call; retry policy, if
/// any, belongs to the caller.
pub trait CatalogSource: Send + Sync + 'static {
    /// Lists every document in the remote catalog, in catalog order.
    fn list_documents(
        &self,
    ) -> impl Future<Output = Result<Vec<DocumentMetadata>, CatalogError>> + Send;

    /// Produces the signed content URL for a document taken from a snapshot.
    fn resolve_content_url(
        &self,
        document: &DocumentMetadata,
    ) -> impl Future<Output = Result<String, CatalogError>> + Send;

    /// Fetches the raw body behind a signed URL.
    fn fetch_content(&self, url: &str)
    -> impl Future<Output = Result<String, CatalogError>> + Send;
}

/// Configuration for the HTTP catalog client.
#[derive(Debug, Clone)]
pub struct HttpCatalogConfig {
    pub listing_url: Url,
    pub request_timeout: Duration,
}

impl HttpCatalogConfig {
    #[must_use]
    pub const fn new(listing_url: Url) -> Self {
        Self {
            listing_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// `reqwest`-backed catalog client.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    http: reqwest::Client,
    config: HttpCatalogConfig,
}

impl HttpCatalogClient {
    /// Builds a client whose requests are bounded by the configured timeout.
    ///
    /// # Errors
    /// Returns the underlying error if the HTTP client cannot be constructed.
    pub fn new(config: HttpCatalogConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub const fn listing_url(&self) -> &Url {
        &self.config.listing_url
    }

    async fn get(&self, url: &str) -> Result<(StatusCode, Vec<u8>), CatalogError> {
        let target = redact(url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| classify_transport(&target, err))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| classify_transport(&target, err))?;
        Ok((status, body.to_vec()))
    }
}

impl CatalogSource for HttpCatalogClient {
    async fn list_documents(&self) -> Result<Vec<DocumentMetadata>, CatalogError> {
        let url = self.config.listing_url.as_str();
        let (status, body) = self.get(url).await?;
        if !status.is_success() {
            return Err(CatalogError::Unreachable {
                target: redact(url),
                document: None,
                message: format!("listing returned status {status}"),
            });
        }

        let envelope: ListingEnvelope = serde_json::from_slice(&body)
            .map_err(|err| CatalogError::Malformed(format!("listing body: {err}")))?;
        let documents = parse_listing(envelope)?;
        debug!(count = documents.len(), "parsed catalog listing");
        Ok(documents)
    }

    async fn resolve_content_url(
        &self,
        document: &DocumentMetadata,
    ) -> Result<String, CatalogError> {
        let endpoint = match &document.locator {
            ContentLocator::Signed(url) => return Ok(url.clone()),
            ContentLocator::Endpoint(endpoint) => endpoint,
        };

        let (status, body) = self.get(endpoint).await?;
        if !status.is_success() {
            return Err(CatalogError::Unreachable {
                target: redact(endpoint),
                document: Some(document.file_name.clone()),
                message: format!("signed URL endpoint returned status {status}"),
            });
        }

        let response: SignedUrlResponse = serde_json::from_slice(&body)
            .map_err(|err| CatalogError::Malformed(format!("signed URL body: {err}")))?;
        let url = response.into_url().ok_or_else(|| {
            CatalogError::Malformed(format!(
                "signed URL response for {} has no signed_url",
                document.file_name
            ))
        })?;
        checked_url(&document.file_name, "signed_url", url)
    }

    async fn fetch_content(&self, url: &str) -> Result<String, CatalogError> {
        let (status, body) = self.get(url).await?;
        if is_rejected_url(status) {
            return Err(CatalogError::ExpiredOrInvalidUrl {
                document: None,
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(CatalogError::Unreachable {
                target: redact(url),
                document: None,
                message: format!("content fetch returned status {status}"),
            });
        }

        String::from_utf8(body)
            .map_err(|err| CatalogError::Malformed(format!("content is not UTF-8: {err}")))
    }
}

/// Converts a listing envelope into document metadata.
///
/// # Errors
/// Returns `CatalogError::Malformed` for a non-200 envelope status, a missing
/// `data` array, an unparsable timestamp, an entry without a content locator,
/// or a duplicate identifier. An empty `data` array is a valid empty catalog.
pub fn parse_listing(envelope: ListingEnvelope) -> Result<Vec<DocumentMetadata>, CatalogError> {
    if let Some(status) = envelope.status
        && status != 200
    {
        let message = envelope.message.unwrap_or_default();
        return Err(CatalogError::Malformed(format!(
            "listing envelope status {status}: {message}"
        )));
    }

    let entries = envelope
        .data
        .ok_or_else(|| CatalogError::Malformed("listing has no data array".to_string()))?;

    let mut seen = HashSet::with_capacity(entries.len());
    let mut documents = Vec::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert(entry.file_name.clone()) {
            return Err(CatalogError::Malformed(format!(
                "duplicate file_name in listing: {}",
                entry.file_name
            )));
        }
        documents.push(parse_entry(entry)?);
    }
    Ok(documents)
}

fn parse_entry(entry: ListingEntry) -> Result<DocumentMetadata, CatalogError> {
    let ListingEntry {
        file_name,
        size,
        updated,
        content_type,
        expires_at,
        signed_url,
        signed_url_endpoint,
    } = entry;

    if file_name.trim().is_empty() {
        return Err(CatalogError::Malformed(
            "listing entry has an empty file_name".to_string(),
        ));
    }

    let updated = DateTime::parse_from_rfc3339(&updated)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| {
            CatalogError::Malformed(format!("invalid updated timestamp for {file_name}: {err}"))
        })?;

    let signed_url = signed_url.filter(|url| !url.trim().is_empty());
    let signed_url_endpoint = signed_url_endpoint.filter(|url| !url.trim().is_empty());
    let locator = match (signed_url, signed_url_endpoint) {
        (Some(url), _) => ContentLocator::Signed(checked_url(&file_name, "signed_url", url)?),
        (None, Some(endpoint)) => ContentLocator::Endpoint(checked_url(
            &file_name,
            "signed_url_endpoint",
            endpoint,
        )?),
        (None, None) => {
            return Err(CatalogError::Malformed(format!(
                "listing entry {file_name} has no signed_url"
            )));
        }
    };

    Ok(DocumentMetadata {
        category: category_for(&file_name),
        file_name,
        size,
        updated,
        content_type,
        expires_at,
        locator,
    })
}

/// Rejects locators that are not absolute http(s) URLs.
fn checked_url(file_name: &str, field: &str, url: String) -> Result<String, CatalogError> {
    match Url::parse(url.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(url),
        _ => Err(CatalogError::Malformed(format!(
            "{field} for {file_name} is not an http(s) URL: {}",
            redact(&url)
        ))),
    }
}

/// Statuses a storage backend uses for expired, revoked, or unknown signed URLs.
const fn is_rejected_url(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST
            | StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::NOT_FOUND
            | StatusCode::GONE
    )
}

fn classify_transport(target: &str, err: reqwest::Error) -> CatalogError {
    if err.is_timeout() {
        CatalogError::Timeout {
            target: target.to_string(),
            document: None,
        }
    } else if err.is_decode() || err.is_builder() {
        CatalogError::Malformed(format!("{target}: {}", err.without_url()))
    } else {
        CatalogError::Unreachable {
            target: target.to_string(),
            document: None,
            message: err.without_url().to_string(),
        }
    }
}

/// Drops the query string so signatures never end up in errors or logs.
fn redact(url: &str) -> String {
    Url::parse(url).map_or_else(
        |_| url.split('?').next().unwrap_or_default().to_string(),
        |mut parsed| {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        },
    )
}
