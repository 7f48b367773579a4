#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{TimeZone, Utc};
use promptlib_core::catalog::category_for;
use promptlib_core::{CatalogError, CatalogSource};
use promptlib_store::{ContentLocator, DocumentMetadata};
use tokio::sync::Semaphore;

pub fn document(file_name: &str, size: u64) -> DocumentMetadata {
    DocumentMetadata {
        file_name: file_name.to_string(),
        size,
        updated: Utc
            .with_ymd_and_hms(2025, 8, 27, 9, 30, 0)
            .single()
            .expect("valid timestamp"),
        category: category_for(file_name),
        content_type: Some("text/plain".to_string()),
        expires_at: Some("2025-09-03T09:30:00Z".to_string()),
        locator: ContentLocator::Signed(signed_url(file_name)),
    }
}

pub fn signed_url(file_name: &str) -> String {
    format!("https://storage.test/prompts/{file_name}?X-Goog-Signature=test")
}

/// In-memory catalog that counts every outbound call.
///
/// When gated, each listing call waits for a permit from [`FakeCatalog::release`].
pub struct FakeCatalog {
    listing: Mutex<Result<Vec<DocumentMetadata>, CatalogError>>,
    bodies: Mutex<HashMap<String, Result<String, CatalogError>>>,
    gate: Option<Semaphore>,
    panic_next_listing: AtomicBool,
    list_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(documents: Vec<DocumentMetadata>) -> Self {
        Self {
            listing: Mutex::new(Ok(documents)),
            bodies: Mutex::new(HashMap::new()),
            gate: None,
            panic_next_listing: AtomicBool::new(false),
            list_calls: AtomicUsize::new(0),
            resolve_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn gated(documents: Vec<DocumentMetadata>) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(documents)
        }
    }

    pub fn with_body(self, file_name: &str, body: &str) -> Self {
        self.set_body(file_name, Ok(body.to_string()));
        self
    }

    pub fn set_body(&self, file_name: &str, body: Result<String, CatalogError>) {
        self.bodies
            .lock()
            .expect("bodies lock")
            .insert(signed_url(file_name), body);
    }

    pub fn set_listing(&self, listing: Result<Vec<DocumentMetadata>, CatalogError>) {
        *self.listing.lock().expect("listing lock") = listing;
    }

    /// Makes the next listing call panic instead of returning.
    pub fn panic_on_next_listing(&self) {
        self.panic_next_listing.store(true, Ordering::SeqCst);
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = self.gate.as_ref() {
            gate.add_permits(permits);
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

impl CatalogSource for FakeCatalog {
    async fn list_documents(&self) -> Result<Vec<DocumentMetadata>, CatalogError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        assert!(
            !self.panic_next_listing.swap(false, Ordering::SeqCst),
            "listing backend crashed"
        );
        if let Some(gate) = self.gate.as_ref() {
            gate.acquire().await.expect("gate open").forget();
        }
        self.listing.lock().expect("listing lock").clone()
    }

    async fn resolve_content_url(
        &self,
        document: &DocumentMetadata,
    ) -> Result<String, CatalogError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        match &document.locator {
            ContentLocator::Signed(url) | ContentLocator::Endpoint(url) => Ok(url.clone()),
        }
    }

    async fn fetch_content(&self, url: &str) -> Result<String, CatalogError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.bodies
            .lock()
            .expect("bodies lock")
            .get(url)
            .cloned()
            .unwrap_or(Err(CatalogError::ExpiredOrInvalidUrl {
                document: None,
                status: 403,
            }))
    }
}
