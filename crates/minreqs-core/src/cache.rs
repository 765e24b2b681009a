use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Shared, immutable list of version strings for one package.
pub type VersionList = Arc<Vec<String>>;

/// Per-process memoizing cache for published version lists.
///
/// Entries never expire and are never persisted: the first lookup for a
/// package pays for the fetch, every later lookup for the same key is served
/// from memory until [`VersionCache::clear`] is called or the cache is dropped.
///
/// Concurrent callers asking for the same key share a single fetch. Each key
/// maps to a [`OnceCell`]; whoever initializes the cell runs the fetch while
/// the others wait on it.
///
/// # Examples
///
/// ```
/// use minreqs_core::cache::VersionCache;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache = VersionCache::new();
///
/// let first = cache
///     .get_or_fetch("numpy", || async { vec!["1.3.0".to_string()] })
///     .await;
/// // Served from memory; the second closure never runs.
/// let second = cache
///     .get_or_fetch("numpy", || async { Vec::new() })
///     .await;
///
/// assert_eq!(first, second);
/// assert_eq!(cache.len(), 1);
/// # }
/// ```
#[derive(Default)]
pub struct VersionCache {
    entries: DashMap<String, Arc<OnceCell<VersionList>>>,
}

impl VersionCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached list for `key`, running `fetch` if no value exists yet.
    ///
    /// At most one `fetch` runs per key. If the running fetch is cancelled,
    /// the next caller starts a new one.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> VersionList
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<String>>,
    {
        // Clone the cell out so the map shard lock is not held across the await.
        let cell = Arc::clone(&self.entries.entry(key.to_owned()).or_default());

        if let Some(versions) = cell.get() {
            tracing::debug!("version cache hit for {}", key);
            return Arc::clone(versions);
        }

        let versions = cell
            .get_or_init(|| async {
                tracing::debug!("version cache miss for {}, fetching", key);
                Arc::new(fetch().await)
            })
            .await;

        Arc::clone(versions)
    }

    /// Returns the cached list for `key` without fetching.
    pub fn get(&self, key: &str) -> Option<VersionList> {
        self.entries
            .get(key)
            .and_then(|cell| cell.get().map(Arc::clone))
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of keys with a fetched value.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    /// Returns `true` if no key has a fetched value.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
