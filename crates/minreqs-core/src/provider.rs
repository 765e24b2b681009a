use crate::cache::VersionCache;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source of published version strings for a package.
///
/// Implementors wrap one transport (a package index, a local package manager,
/// a fixture). The contract is deliberately infallible: on any transport
/// failure an implementation logs a warning and returns an empty list, and the
/// resolver turns the empty list into a "no satisfying version" error.
///
/// Returned versions may be newest-first or unordered. Prereleases should
/// already be filtered out.
///
/// # Examples
///
/// ```
/// use minreqs_core::VersionProvider;
/// use async_trait::async_trait;
///
/// struct Pinned;
///
/// #[async_trait]
/// impl VersionProvider for Pinned {
///     async fn fetch_versions(&self, _package: &str) -> Vec<String> {
///         vec!["1.0.0".into()]
///     }
///
///     fn name(&self) -> &'static str {
///         "pinned"
///     }
/// }
/// ```
#[async_trait]
pub trait VersionProvider: Send + Sync {
    /// Fetches the known version strings for `package`.
    async fn fetch_versions(&self, package: &str) -> Vec<String>;

    /// Short transport name used in log messages.
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<P: VersionProvider + ?Sized> VersionProvider for Arc<P> {
    async fn fetch_versions(&self, package: &str) -> Vec<String> {
        (**self).fetch_versions(package).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Puts any provider behind a [`VersionCache`].
///
/// The cache is shared through an `Arc`, so several providers (or several
/// resolver passes) can reuse the same per-process memo.
pub struct CachingProvider<P> {
    inner: P,
    cache: Arc<VersionCache>,
}

impl<P: VersionProvider> CachingProvider<P> {
    /// Wraps `inner` with a fresh, private cache.
    pub fn new(inner: P) -> Self {
        Self::with_cache(inner, Arc::new(VersionCache::new()))
    }

    /// Wraps `inner` with an existing cache.
    pub fn with_cache(inner: P, cache: Arc<VersionCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<VersionCache> {
        &self.cache
    }
}

#[async_trait]
impl<P: VersionProvider> VersionProvider for CachingProvider<P> {
    async fn fetch_versions(&self, package: &str) -> Vec<String> {
        let versions = self
            .cache
            .get_or_fetch(package, || self.inner.fetch_versions(package))
            .await;
        versions.as_ref().clone()
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

/// Tries `primary` first and falls back to `secondary` when it yields nothing.
pub struct FallbackProvider<A, B> {
    primary: A,
    secondary: B,
}

impl<A: VersionProvider, B: VersionProvider> FallbackProvider<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl<A: VersionProvider, B: VersionProvider> VersionProvider for FallbackProvider<A, B> {
    async fn fetch_versions(&self, package: &str) -> Vec<String> {
        let versions = self.primary.fetch_versions(package).await;
        if !versions.is_empty() {
            return versions;
        }

        tracing::debug!(
            "{} returned no versions for {}, falling back to {}",
            self.primary.name(),
            package,
            self.secondary.name()
        );
        self.secondary.fetch_versions(package).await
    }

    fn name(&self) -> &'static str {
        self.primary.name()
    }
}

/// In-memory provider backed by a fixed table.
///
/// Useful as a fixture index and for fully reproducible runs. Counts every
/// lookup so callers can assert on cache behavior.
#[derive(Debug, Default)]
pub struct StaticProvider {
    packages: HashMap<String, Vec<String>>,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the versions known for `package`.
    pub fn with_package<I, S>(mut self, package: &str, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages.insert(
            package.to_string(),
            versions.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Number of `fetch_versions` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VersionProvider for StaticProvider {
    async fn fetch_versions(&self, package: &str) -> Vec<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.packages.get(package).cloned().unwrap_or_default()
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
