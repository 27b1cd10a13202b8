use async_trait::async_trait;

use super::{paginate, AdapterPage, AdapterResult, CatalogAdapter};
use crate::models::{BoundingBox, Category, ObjectSummary};
use crate::spatial::filter_by_bbox;

/// Adapter over a fixed in-memory list of objects.
#[derive(Debug, Clone)]
pub struct MemoryAdapter {
    id: String,
    items: Vec<ObjectSummary>,
}

impl MemoryAdapter {
    pub fn new(id: impl Into<String>, items: Vec<ObjectSummary>) -> Self {
        Self {
            id: id.into(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl CatalogAdapter for MemoryAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    async fn search_by_category(
        &self,
        category: Category,
        bbox: Option<BoundingBox>,
        page: u32,
        limit: u32,
    ) -> AdapterResult<AdapterPage> {
        let matching: Vec<ObjectSummary> = self
            .items
            .iter()
            .filter(|item| item.category == category)
            .cloned()
            .collect();
        let matching = match bbox {
            Some(bbox) => filter_by_bbox(matching, &bbox),
            None => matching,
        };
        let total = matching.len();
        Ok(AdapterPage::new(paginate(matching, page, limit), Some(total)))
    }

    async fn get_by_id(&self, id: &str) -> AdapterResult<Option<ObjectSummary>> {
        Ok(self.items.iter().find(|item| item.id == id).cloned())
    }
}
