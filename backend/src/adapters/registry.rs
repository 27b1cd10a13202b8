//! Fan-out search and by-id lookup across registered adapters.
//!
//! A search calls every adapter concurrently, each under its own timeout and
//! the caller's cancellation token. Outcomes are partitioned into successes and
//! failures; successful items are bbox-filtered, merged in registration order,
//! deduplicated on [`ObjectSummary::dedup_key`] and paginated over the merged set.

use futures::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::{paginate, AdapterError, AdapterFailure, AdapterPage, AdapterResult, CatalogAdapter};
use crate::cache::{CacheStats, Clock, Sweep, SystemClock, TtlCache};
use crate::config::{CacheSettings, CatalogConfig, RegistrySettings};
use crate::error::{CatalogError, CatalogResult, ErrorContext};
use crate::models::{BoundingBox, Category, ObjectSummary};
use crate::spatial::filter_by_bbox;

/// Page size used when a query does not set one.
pub const DEFAULT_LIMIT: u32 = 50;

fn bbox_key(bbox: Option<&BoundingBox>) -> String {
    bbox.map_or_else(|| "none".to_string(), BoundingBox::cache_key)
}

/// A category search, optionally limited to a sky region.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub category: Category,
    pub bbox: Option<BoundingBox>,
    /// 1-based
    pub page: u32,
    pub limit: u32,
}

impl SearchQuery {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            bbox: None,
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Reject `page < 1` and `limit` outside `1..=max_limit`.
    pub fn validate(&self, max_limit: u32) -> CatalogResult<()> {
        if self.page == 0 {
            return Err(CatalogError::invalid_field("page", "page must be >= 1"));
        }
        if self.limit == 0 || self.limit > max_limit {
            return Err(CatalogError::invalid_field(
                "limit",
                format!("limit must be between 1 and {}, got {}", max_limit, self.limit),
            ));
        }
        Ok(())
    }

    /// `search:{category}:{bbox|none}:{page}:{limit}`
    pub fn cache_key(&self) -> String {
        format!(
            "search:{}:{}:{}:{}",
            self.category,
            bbox_key(self.bbox.as_ref()),
            self.page,
            self.limit
        )
    }

    /// Items each adapter must supply so the merged set covers this page.
    fn window(&self) -> u32 {
        self.page.saturating_mul(self.limit)
    }

    fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.limit as usize)
    }
}

/// Merged, deduplicated page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub items: Vec<ObjectSummary>,
    pub page: u32,
    pub limit: u32,
    /// Deduplicated count across all successful adapters
    pub total: usize,
    pub has_more: bool,
    /// Adapters that answered, in registration order
    pub sources: Vec<String>,
    pub failures: Vec<AdapterFailure>,
}

/// Outcome of a by-id lookup. `item: None` is the typed "not found".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResult {
    pub item: Option<ObjectSummary>,
    /// Adapter that produced the item
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<AdapterFailure>,
}

impl LookupResult {
    pub fn is_found(&self) -> bool {
        self.item.is_some()
    }
}

/// Counters for the three registry caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryCacheStats {
    pub pages: CacheStats,
    pub adapter_pages: CacheStats,
    pub lookups: CacheStats,
}

struct Outcome {
    adapter: String,
    result: AdapterResult<AdapterPage>,
}

/// Builder for [`AdapterRegistry`].
///
/// # Example
/// ```ignore
/// use sky_catalog::adapters::{RegistryBuilder, SyntheticAdapter};
///
/// let registry = RegistryBuilder::new()
///     .register(SyntheticAdapter::inpe())
///     .register(SyntheticAdapter::csa())
///     .build()?;
/// ```
pub struct RegistryBuilder {
    adapters: Vec<Arc<dyn CatalogAdapter>>,
    adapter_timeout: Duration,
    default_limit: u32,
    max_limit: u32,
    cache_capacity: usize,
    cache_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        let registry = RegistrySettings::default();
        let cache = CacheSettings::default();
        Self {
            adapters: Vec::new(),
            adapter_timeout: registry.adapter_timeout(),
            default_limit: registry.default_limit,
            max_limit: registry.max_limit,
            cache_capacity: cache.capacity,
            cache_ttl: cache.ttl(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Take timeout, paging limits and cache sizing from `config`.
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new()
            .with_timeout(config.registry.adapter_timeout())
            .with_limits(config.registry.default_limit, config.registry.max_limit)
            .with_cache(config.cache.capacity, config.cache.ttl())
    }

    /// Append an adapter. Registration order is by-id precedence and merge order.
    pub fn register<A: CatalogAdapter + 'static>(self, adapter: A) -> Self {
        self.register_arc(Arc::new(adapter))
    }

    pub fn register_arc(mut self, adapter: Arc<dyn CatalogAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout = timeout;
        self
    }

    pub fn with_limits(mut self, default_limit: u32, max_limit: u32) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        self
    }

    pub fn with_cache(mut self, capacity: usize, ttl: Duration) -> Self {
        self.cache_capacity = capacity;
        self.cache_ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Freeze the adapter list. Fails on duplicate adapter ids or unusable limits.
    pub fn build(self) -> CatalogResult<AdapterRegistry> {
        let ctx = || ErrorContext::new("build_registry");

        let mut seen = HashSet::new();
        for adapter in &self.adapters {
            if !seen.insert(adapter.id().to_string()) {
                return Err(CatalogError::Configuration {
                    message: format!("Adapter '{}' registered twice", adapter.id()),
                    context: ctx().with_field("adapters"),
                });
            }
        }
        if self.adapter_timeout.is_zero() {
            return Err(CatalogError::Configuration {
                message: "Adapter timeout must be positive".to_string(),
                context: ctx().with_field("adapter_timeout"),
            });
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(CatalogError::Configuration {
                message: format!(
                    "default_limit {} must be between 1 and max_limit {}",
                    self.default_limit, self.max_limit
                ),
                context: ctx().with_field("default_limit"),
            });
        }

        let (capacity, ttl) = (self.cache_capacity, self.cache_ttl);
        let registry = AdapterRegistry {
            pages: TtlCache::with_clock(capacity, ttl, Arc::clone(&self.clock)),
            adapter_pages: TtlCache::with_clock(capacity, ttl, Arc::clone(&self.clock)),
            lookups: TtlCache::with_clock(capacity, ttl, Arc::clone(&self.clock)),
            adapters: self.adapters,
            adapter_timeout: self.adapter_timeout,
            default_limit: self.default_limit,
            max_limit: self.max_limit,
        };
        info!(
            "Adapter registry ready with {} adapters: {:?}",
            registry.adapters.len(),
            registry.adapter_ids()
        );
        Ok(registry)
    }
}

/// Immutable set of adapters plus the shared result caches.
///
/// Build once at startup with [`RegistryBuilder`] and share behind an `Arc`.
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn CatalogAdapter>>,
    adapter_timeout: Duration,
    default_limit: u32,
    max_limit: u32,
    pages: TtlCache<String, SearchPage>,
    adapter_pages: TtlCache<String, AdapterPage>,
    lookups: TtlCache<String, LookupResult>,
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.adapter_ids())
            .field("adapter_timeout", &self.adapter_timeout)
            .field("default_limit", &self.default_limit)
            .field("max_limit", &self.max_limit)
            .finish()
    }
}

impl AdapterRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registered adapter ids in registration order.
    pub fn adapter_ids(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn default_limit(&self) -> u32 {
        self.default_limit
    }

    pub fn max_limit(&self) -> u32 {
        self.max_limit
    }

    /// Start a query using this registry's default page size.
    pub fn query(&self, category: Category) -> SearchQuery {
        SearchQuery::new(category).with_limit(self.default_limit)
    }

    pub fn cache_stats(&self) -> RegistryCacheStats {
        RegistryCacheStats {
            pages: self.pages.stats(),
            adapter_pages: self.adapter_pages.stats(),
            lookups: self.lookups.stats(),
        }
    }

    /// Search every adapter. Equivalent to [`Self::search_with_cancel`] with a
    /// token that is never cancelled.
    pub async fn search(&self, query: &SearchQuery) -> CatalogResult<SearchPage> {
        self.search_with_cancel(query, &CancellationToken::new()).await
    }

    /// Search every adapter concurrently.
    ///
    /// Adapter failures and timeouts never fail the search; they are listed in
    /// [`SearchPage::failures`]. Only invalid input and cancellation return `Err`.
    /// Adapter pages that completed before a cancellation stay cached.
    pub async fn search_with_cancel(
        &self,
        query: &SearchQuery,
        token: &CancellationToken,
    ) -> CatalogResult<SearchPage> {
        query
            .validate(self.max_limit)
            .map_err(|e| e.with_operation("search"))?;

        let key = query.cache_key();
        if token.is_cancelled() {
            return Err(Self::cancelled(&key));
        }
        if let Some(page) = self.pages.get(&key) {
            debug!("Search cache hit: {}", key);
            return Ok(page);
        }
        debug!("Search cache miss: {}", key);

        let outcomes = join_all(
            self.adapters
                .iter()
                .map(|adapter| self.fetch_adapter(adapter, query, token)),
        )
        .await;

        if token.is_cancelled() {
            info!("Search cancelled: {}", key);
            return Err(Self::cancelled(&key));
        }

        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(page) => successes.push((outcome.adapter, page)),
                Err(error) => {
                    warn!("Adapter {} failed during search: {}", outcome.adapter, error);
                    failures.push(AdapterFailure::new(outcome.adapter, error));
                }
            }
        }

        let all_failed = successes.is_empty() && !failures.is_empty();
        if all_failed {
            warn!("All {} adapters failed for {}", failures.len(), key);
        }

        let window = query.window() as usize;
        let truncated = successes
            .iter()
            .any(|(_, page)| page.total.is_some_and(|t| t > window));
        let sources = successes.iter().map(|(id, _)| id.clone()).collect();

        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for (_, page) in successes {
            for item in page.items {
                if seen.insert(item.dedup_key()) {
                    merged.push(item);
                }
            }
        }

        let total = merged.len();
        let items = paginate(merged, query.page, query.limit);
        let has_more = query.offset() + items.len() < total || truncated;

        let page = SearchPage {
            items,
            page: query.page,
            limit: query.limit,
            total,
            has_more,
            sources,
            failures,
        };

        if !all_failed {
            self.pages.set(key, page.clone());
        }
        Ok(page)
    }

    async fn fetch_adapter(
        &self,
        adapter: &Arc<dyn CatalogAdapter>,
        query: &SearchQuery,
        token: &CancellationToken,
    ) -> Outcome {
        let id = adapter.id().to_string();
        let window = query.window();
        let key = format!(
            "adapter:{}:search:{}:{}:1:{}",
            id,
            query.category,
            bbox_key(query.bbox.as_ref()),
            window
        );
        if let Some(page) = self.adapter_pages.get(&key) {
            debug!("Adapter cache hit: {}", key);
            return Outcome {
                adapter: id,
                result: Ok(page),
            };
        }

        let call = adapter.search_by_category(query.category, query.bbox, 1, window);
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(AdapterError::Cancelled),
            timed = tokio::time::timeout(self.adapter_timeout, call) => match timed {
                Ok(result) => result,
                Err(_) => Err(AdapterError::Timeout(self.adapter_timeout)),
            },
        };

        let result = result.map(|page| match &query.bbox {
            Some(bbox) => AdapterPage::new(filter_by_bbox(page.items, bbox), page.total),
            None => page,
        });
        if let Ok(page) = &result {
            self.adapter_pages.set(key, page.clone());
        }

        Outcome {
            adapter: id,
            result,
        }
    }

    /// Ask adapters in registration order; the first hit wins.
    ///
    /// Found and not-found results are both cached. A miss where every adapter
    /// failed is returned but not cached.
    pub async fn get_by_id(&self, id: &str) -> CatalogResult<LookupResult> {
        let id = id.trim();
        if id.is_empty() {
            return Err(CatalogError::invalid_field("id", "id must not be empty")
                .with_operation("get_by_id"));
        }

        let key = format!("getById:{}", id);
        if let Some(hit) = self.lookups.get(&key) {
            debug!("Lookup cache hit: {}", key);
            return Ok(hit);
        }

        let mut failures = Vec::new();
        for adapter in &self.adapters {
            let lookup = tokio::time::timeout(self.adapter_timeout, adapter.get_by_id(id));
            let result = match lookup.await {
                Ok(result) => result,
                Err(_) => Err(AdapterError::Timeout(self.adapter_timeout)),
            };
            match result {
                Ok(Some(item)) => {
                    let found = LookupResult {
                        item: Some(item),
                        source: Some(adapter.id().to_string()),
                        failures,
                    };
                    self.lookups.set(key, found.clone());
                    return Ok(found);
                }
                Ok(None) => {}
                Err(error) => {
                    warn!("Adapter {} failed looking up {}: {}", adapter.id(), id, error);
                    failures.push(AdapterFailure::new(adapter.id(), error));
                }
            }
        }

        let all_failed = !self.adapters.is_empty() && failures.len() == self.adapters.len();
        let missing = LookupResult {
            item: None,
            source: None,
            failures,
        };
        if !all_failed {
            self.lookups.set(key, missing.clone());
        }
        Ok(missing)
    }

    fn cancelled(key: &str) -> CatalogError {
        CatalogError::Cancelled {
            message: "search cancelled by caller".to_string(),
            context: ErrorContext::new("search").with_details(key),
        }
    }
}

impl Sweep for AdapterRegistry {
    fn sweep(&self) -> usize {
        self.pages.cleanup() + self.adapter_pages.cleanup() + self.lookups.cleanup()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryAdapter;

    #[test]
    fn test_query_validation() {
        let ok = SearchQuery::new(Category::Stars);
        assert!(ok.validate(500).is_ok());

        let err = SearchQuery::new(Category::Stars).with_page(0).validate(500).unwrap_err();
        assert_eq!(err.context().field.as_deref(), Some("page"));

        let err = SearchQuery::new(Category::Stars).with_limit(501).validate(500).unwrap_err();
        assert_eq!(err.context().field.as_deref(), Some("limit"));
        assert!(SearchQuery::new(Category::Stars).with_limit(0).validate(500).is_err());
    }

    #[test]
    fn test_query_cache_key() {
        let query = SearchQuery::new(Category::StarSystems)
            .with_bbox(BoundingBox::new(350.0, -5.0, 10.0, 5.0).unwrap())
            .with_page(2)
            .with_limit(20);
        assert_eq!(
            query.cache_key(),
            "search:star-systems:350.00000,-5.00000,10.00000,5.00000:2:20"
        );
        assert_eq!(
            SearchQuery::new(Category::Stars).cache_key(),
            "search:stars:none:1:50"
        );
        assert_eq!(query.window(), 40);
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn test_build_rejects_duplicate_ids() {
        let err = RegistryBuilder::new()
            .register(MemoryAdapter::new("dup", vec![]))
            .register(MemoryAdapter::new("dup", vec![]))
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::Configuration { .. }));
    }

    #[test]
    fn test_build_rejects_bad_limits() {
        assert!(RegistryBuilder::new().with_limits(600, 500).build().is_err());
        assert!(RegistryBuilder::new()
            .with_timeout(Duration::ZERO)
            .build()
            .is_err());
    }

    #[tokio::test]
    async fn test_empty_registry_returns_empty_page() {
        let registry = RegistryBuilder::new().build().unwrap();
        let page = registry.search(&registry.query(Category::Comets)).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
        assert!(!page.has_more);
        assert!(page.failures.is_empty());
    }

    #[tokio::test]
    async fn test_search_rejects_invalid_paging() {
        let registry = RegistryBuilder::new().build().unwrap();
        let err = registry
            .search(&SearchQuery::new(Category::Stars).with_page(0))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.context().operation.as_deref(), Some("search"));
    }

    #[tokio::test]
    async fn test_get_by_id_rejects_blank_id() {
        let registry = RegistryBuilder::new().build().unwrap();
        assert!(registry.get_by_id("   ").await.unwrap_err().is_validation());
    }
}
