//! Bounded-staleness cache over the remote catalog listing.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use promptlib_store::CatalogSnapshot;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::CatalogSource;
use crate::error::CatalogError;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

type SnapshotResult = Result<Arc<CatalogSnapshot>, CatalogError>;
type RefreshFuture = Shared<BoxFuture<'static, SnapshotResult>>;

/// Configuration for the metadata cache.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Snapshots at least this old are stale. Zero disables caching.
    pub ttl: Duration,
}

impl CacheConfig {
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self { ttl }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

/// Shared, single-flight cache of the catalog listing.
pub struct MetadataCache<S: CatalogSource> {
    inner: Arc<CacheInner<S>>,
}

impl<S: CatalogSource> Clone for MetadataCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Internal cache state shared across clones.
struct CacheInner<S: CatalogSource> {
    source: Arc<S>,
    config: CacheConfig,
    state: RwLock<CacheState>,
}

#[derive(Default)]
struct CacheState {
    held: Option<HeldSnapshot>,
    refreshing: Option<InFlight>,
    refresh_seq: u64,
}

struct InFlight {
    id: u64,
    future: RefreshFuture,
}

struct HeldSnapshot {
    snapshot: Arc<CatalogSnapshot>,
    fetched_at: Instant,
}

impl CacheState {
    fn fresh_snapshot(&self, ttl: Duration) -> Option<Arc<CatalogSnapshot>> {
        self.held
            .as_ref()
            .filter(|held| held.fetched_at.elapsed() < ttl)
            .map(|held| held.snapshot.clone())
    }

    /// Clears the in-flight marker if it still belongs to refresh `id`.
    fn release(&mut self, id: u64) {
        if self.refreshing.as_ref().is_some_and(|flight| flight.id == id) {
            self.refreshing = None;
        }
    }
}

impl<S: CatalogSource> MetadataCache<S> {
    #[must_use]
    pub fn new(source: S, config: CacheConfig) -> Self {
        Self::with_source(Arc::new(source), config)
    }

    #[must_use]
    pub fn with_source(source: Arc<S>, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source,
                config,
                state: RwLock::new(CacheState::default()),
            }),
        }
    }

    #[must_use]
    pub fn source(&self) -> Arc<S> {
        self.inner.source.clone()
    }

    #[must_use]
    pub fn config(&self) -> CacheConfig {
        self.inner.config
    }

    /// Returns the current catalog snapshot.
    ///
    /// A fresh snapshot is served without network access unless
    /// `force_refresh` is set. Otherwise the caller joins the in-flight
    /// refresh, or starts one, and receives its outcome.
    ///
    /// # Errors
    /// Returns the refresh failure; the previously held snapshot is kept.
    pub async fn get_snapshot(&self, force_refresh: bool) -> SnapshotResult {
        if !force_refresh {
            let state = self.inner.state.read().await;
            if let Some(snapshot) = state.fresh_snapshot(self.inner.config.ttl) {
                debug!(version = snapshot.version, "catalog cache hit");
                return Ok(snapshot);
            }
        }

        let refresh = {
            let mut state = self.inner.state.write().await;
            if !force_refresh
                && let Some(snapshot) = state.fresh_snapshot(self.inner.config.ttl)
            {
                return Ok(snapshot);
            }
            if let Some(flight) = state.refreshing.as_ref() {
                debug!(force_refresh, "joining in-flight catalog refresh");
                flight.future.clone()
            } else {
                self.spawn_refresh(&mut state)
            }
        };

        refresh.await
    }

    /// Last successfully fetched snapshot, fresh or not. Never touches the
    /// network.
    pub async fn cached(&self) -> Option<Arc<CatalogSnapshot>> {
        let state = self.inner.state.read().await;
        state.held.as_ref().map(|held| held.snapshot.clone())
    }

    /// Whether a refresh is currently in flight.
    pub async fn is_refreshing(&self) -> bool {
        self.inner.state.read().await.refreshing.is_some()
    }

    // The refresh runs on its own task so callers that stop waiting do not
    // cancel the listing call or leave the marker behind.
    fn spawn_refresh(&self, state: &mut CacheState) -> RefreshFuture {
        state.refresh_seq += 1;
        let id = state.refresh_seq;
        let inner = self.inner.clone();
        let task = tokio::spawn({
            let inner = inner.clone();
            async move { inner.refresh(id).await }
        });
        let future = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    inner.state.write().await.release(id);
                    Err(CatalogError::Unreachable {
                        target: "catalog refresh".to_string(),
                        document: None,
                        message: format!("refresh task failed: {err}"),
                    })
                }
            }
        }
        .boxed()
        .shared();
        state.refreshing = Some(InFlight {
            id,
            future: future.clone(),
        });
        future
    }
}

impl<S: CatalogSource> CacheInner<S> {
    async fn refresh(&self, id: u64) -> SnapshotResult {
        let started = Instant::now();
        let outcome = AssertUnwindSafe(self.source.list_documents())
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(CatalogError::Unreachable {
                    target: "catalog refresh".to_string(),
                    document: None,
                    message: format!("catalog source panicked: {}", panic_message(&*panic)),
                })
            });

        let mut state = self.state.write().await;
        state.release(id);
        match outcome {
            Ok(documents) => {
                let version = state
                    .held
                    .as_ref()
                    .map_or(1, |held| held.snapshot.version + 1);
                let snapshot = Arc::new(CatalogSnapshot::new(version, Utc::now(), documents));
                state.held = Some(HeldSnapshot {
                    snapshot: snapshot.clone(),
                    fetched_at: Instant::now(),
                });
                info!(
                    version,
                    documents = snapshot.len(),
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "catalog refreshed"
                );
                Ok(snapshot)
            }
            Err(err) => {
                warn!(
                    error = %err,
                    kept_version = state.held.as_ref().map(|held| held.snapshot.version),
                    "catalog refresh failed"
                );
                Err(err)
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
