//! Deterministic demo providers.
//!
//! Each provider scatters a fixed number of objects per category around a
//! centre. Positions are derived from a hash of the object id, so repeated
//! searches return identical data.

use async_trait::async_trait;

use super::{paginate, AdapterPage, AdapterResult, CatalogAdapter};
use crate::models::{BoundingBox, Category, ObjectSummary, SkyCoordinate};
use crate::spatial::filter_by_bbox;

/// Andromeda, where the demo providers place their objects.
const DEMO_CENTER_RA: f64 = 10.6847083;
const DEMO_CENTER_DEC: f64 = 41.26875;

/// FNV-1a followed by a splitmix64 finalizer.
fn hash_unit(seed: &str, salt: u64) -> f64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in seed.as_bytes() {
        h ^= u64::from(*byte);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    let mut z = h ^ salt.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64
}

#[derive(Debug, Clone)]
pub struct SyntheticAdapter {
    id: String,
    prefix: String,
    label: String,
    source: String,
    center: SkyCoordinate,
    /// Half-width of the scatter box, degrees
    spread: f64,
    count: usize,
}

impl SyntheticAdapter {
    pub fn new(
        id: impl Into<String>,
        prefix: impl Into<String>,
        source: impl Into<String>,
        count: usize,
    ) -> Self {
        let prefix = prefix.into();
        Self {
            id: id.into(),
            label: prefix.clone(),
            prefix,
            source: source.into(),
            center: SkyCoordinate::from_degrees(DEMO_CENTER_RA, DEMO_CENTER_DEC),
            spread: 0.1,
            count,
        }
    }

    /// Canadian Space Agency demo provider (`CSA-` ids).
    pub fn csa() -> Self {
        Self::new("csa-mock", "CSA", "csa:mock", 30)
    }

    /// AEB/INPE demo provider (`INPE-` ids).
    pub fn inpe() -> Self {
        Self::new("aeb-inpe", "INPE", "aeb:inpe", 40)
    }

    pub fn with_center(mut self, center: SkyCoordinate, spread: f64) -> Self {
        self.center = center;
        self.spread = spread.abs();
        self
    }

    fn object_id(&self, category: Category, index: usize) -> String {
        format!("{}-{}-{}", self.prefix, category, index)
    }

    fn object(&self, category: Category, index: usize) -> ObjectSummary {
        let id = self.object_id(category, index);
        let ra = self.center.ra_deg() + (hash_unit(&id, 1) * 2.0 - 1.0) * self.spread;
        let dec = self.center.dec_deg() + (hash_unit(&id, 2) * 2.0 - 1.0) * self.spread;
        let name = format!("{} {} {}", self.label, category, index);
        ObjectSummary::new(
            id,
            name,
            category,
            crate::models::normalize_ra(ra),
            dec.clamp(-90.0, 90.0),
            self.source.clone(),
        )
    }

    fn generate(&self, category: Category) -> Vec<ObjectSummary> {
        (0..self.count).map(|i| self.object(category, i)).collect()
    }

    /// Recover `(category, index)` from an id this provider generated.
    fn parse_id(&self, id: &str) -> Option<(Category, usize)> {
        let rest = id.strip_prefix(&self.prefix)?.strip_prefix('-')?;
        let (category, index) = rest.rsplit_once('-')?;
        let category = category.parse().ok()?;
        let index = index.parse().ok()?;
        (index < self.count).then_some((category, index))
    }
}

#[async_trait]
impl CatalogAdapter for SyntheticAdapter {
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
        let items = self.generate(category);
        let items = match bbox {
            Some(bbox) => filter_by_bbox(items, &bbox),
            None => items,
        };
        let total = items.len();
        Ok(AdapterPage::new(paginate(items, page, limit), Some(total)))
    }

    async fn get_by_id(&self, id: &str) -> AdapterResult<Option<ObjectSummary>> {
        if !id.starts_with(&format!("{}-", self.prefix)) {
            return Ok(None);
        }
        let item = match self.parse_id(id) {
            Some((category, index)) => self.object(category, index),
            // foreign-looking ids with our prefix resolve to the centre
            None => ObjectSummary::new(
                id,
                id,
                Category::Others,
                self.center.ra_deg(),
                self.center.dec_deg(),
                self.source.clone(),
            ),
        };
        Ok(Some(item))
    }
}
