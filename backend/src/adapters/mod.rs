//! Pluggable catalog providers and the registry that aggregates them.

mod error;
#[cfg(feature = "mast")]
pub mod mast;
pub mod memory;
pub mod registry;
pub mod synthetic;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{BoundingBox, Category, ObjectSummary};

pub use error::{AdapterError, AdapterFailure, AdapterResult};
#[cfg(feature = "mast")]
pub use mast::{MastAdapter, MastRecord};
pub use memory::MemoryAdapter;
pub use registry::{AdapterRegistry, LookupResult, RegistryBuilder, SearchPage, SearchQuery};
pub use synthetic::SyntheticAdapter;

/// One page of results from a single adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdapterPage {
    pub items: Vec<ObjectSummary>,
    /// Total matches upstream, when the provider reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl AdapterPage {
    pub fn new(items: Vec<ObjectSummary>, total: Option<usize>) -> Self {
        Self { items, total }
    }
}

/// Contract implemented by every upstream catalog provider.
///
/// Implementations are registered once at startup and shared across
/// concurrent requests, so they must be `Send + Sync`.
#[async_trait]
pub trait CatalogAdapter: Send + Sync {
    /// Stable identifier, e.g. `nasa-hubble`.
    fn id(&self) -> &str;

    /// Search one category, optionally constrained to a bounding box.
    ///
    /// # Arguments
    /// * `category` - Object category to search
    /// * `bbox` - Optional sky region; adapters may ignore it, the registry filters again
    /// * `page` - 1-based page number
    /// * `limit` - Page size
    async fn search_by_category(
        &self,
        category: Category,
        bbox: Option<BoundingBox>,
        page: u32,
        limit: u32,
    ) -> AdapterResult<AdapterPage>;

    /// Look up one object by its provider-scoped id. `Ok(None)` means not found.
    async fn get_by_id(&self, id: &str) -> AdapterResult<Option<ObjectSummary>>;
}

/// Slice `items` to the 1-based `page` of size `limit`.
pub(crate) fn paginate<T>(items: Vec<T>, page: u32, limit: u32) -> Vec<T> {
    let start = (page.max(1) as usize - 1).saturating_mul(limit as usize);
    items.into_iter().skip(start).take(limit as usize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(paginate(items.clone(), 1, 4), vec![0, 1, 2, 3]);
        assert_eq!(paginate(items.clone(), 3, 4), vec![8, 9]);
        assert!(paginate(items, 4, 4).is_empty());
    }
}
