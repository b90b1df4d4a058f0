//! Single-flight metadata cache
//!
//! Each package name maps to a once-cell. The first lookup for a name runs
//! the fetch; lookups that arrive while it is in flight await the same
//! cell instead of issuing their own request. A failed fetch leaves the
//! cell empty so a later lookup can try again.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::api::PackageDocument;
use crate::RegistryResult;

type DocumentCell = Arc<OnceCell<Arc<PackageDocument>>>;

/// How a lookup was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Served from the cache (or from a fetch another caller started); carries the running hit count
    Cached(usize),
    /// This caller performed the fetch; carries the running fetch count
    Fetched(usize),
}

/// In-memory package document cache with in-flight de-duplication
#[derive(Debug, Default)]
pub struct MetadataCache {
    /// Cache storage
    entries: DashMap<String, DocumentCell>,
    /// Lookups answered without a fetch
    cache_hits: AtomicUsize,
    /// Fetches started
    registry_fetches: AtomicUsize,
}

impl MetadataCache {
    /// Create new metadata cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached document for `name`, running `fetch` only if no
    /// other caller has fetched or is fetching it.
    ///
    /// `fetch` receives the running registry fetch number.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        name: &str,
        fetch: F,
    ) -> RegistryResult<(Arc<PackageDocument>, Lookup)>
    where
        F: FnOnce(usize) -> Fut,
        Fut: Future<Output = RegistryResult<PackageDocument>>,
    {
        // Clone the cell out so the shard lock is released before awaiting
        let cell: DocumentCell = self.entries.entry(name.to_string()).or_default().value().clone();

        let mut fetch_number = None;
        let document = cell
            .get_or_try_init(|| {
                let number = self.registry_fetches.fetch_add(1, Ordering::Relaxed) + 1;
                fetch_number = Some(number);
                let pending = fetch(number);
                async move { pending.await.map(Arc::new) }
            })
            .await?
            .clone();

        let lookup = match fetch_number {
            Some(number) => Lookup::Fetched(number),
            None => Lookup::Cached(self.cache_hits.fetch_add(1, Ordering::Relaxed) + 1),
        };
        Ok((document, lookup))
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.iter().filter(|cell| cell.initialized()).count(),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            registry_fetches: self.registry_fetches.load(Ordering::Relaxed),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of documents held
    pub entries: usize,
    /// Lookups answered without a fetch
    pub cache_hits: usize,
    /// Fetches started, including failed ones
    pub registry_fetches: usize,
}
