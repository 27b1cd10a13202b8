//! MAST portal client for Hubble observations.
//!
//! Upstream records are decoded into [`MastRecord`], an explicit struct whose
//! fields are all optional, and mapped by [`MastRecord::normalize`]:
//!
//! - id: `obsid`, then `obs_id`, then `objID`, then `target_name`
//! - name: `target_name`, then `title`, then the id
//! - position: `s_ra`/`s_dec`, then `ra`/`dec`, then `ra_targ`/`dec_targ`
//! - source: `nasa:hst` when `obs_collection` mentions HST, otherwise `nasa:mast`
//! - thumbnail: `previewURL`, then `jpegURL`; preview: `dataURL`, then `fitsURL`, then the thumbnail
//!
//! Records with no usable id or position are dropped.

use async_trait::async_trait;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use super::{AdapterError, AdapterPage, AdapterResult, CatalogAdapter};
use crate::config::MastSettings;
use crate::models::{is_valid_dec, normalize_ra, BoundingBox, Category, ObjectSummary};
use crate::spatial::filter_by_bbox;

/// Free-text term sent to the portal for each category.
fn portal_term(category: Category) -> &'static str {
    match category {
        Category::StarSystems => "star system",
        Category::Stars => "star",
        Category::Planets => "exoplanet",
        Category::Constellations => "constellation",
        Category::Nebulae => "nebula",
        Category::Clusters => "cluster",
        Category::Galaxies => "galaxy",
        Category::Comets => "comet",
        Category::Asteroids => "asteroid",
        // no portal vocabulary for these
        Category::Moons | Category::Others => "star",
    }
}

/// Identifier fields arrive as either strings or numbers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Text(s) => f.write_str(s),
            RecordId::Number(n) => write!(f, "{}", n),
        }
    }
}

/// One observation as returned by the MAST portal.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MastRecord {
    pub obsid: Option<RecordId>,
    pub obs_id: Option<RecordId>,
    #[serde(rename = "objID")]
    pub obj_id: Option<RecordId>,
    pub target_name: Option<String>,
    pub title: Option<String>,
    pub s_ra: Option<f64>,
    pub s_dec: Option<f64>,
    pub ra: Option<f64>,
    pub dec: Option<f64>,
    pub ra_targ: Option<f64>,
    pub dec_targ: Option<f64>,
    pub mag: Option<f64>,
    pub redshift: Option<f64>,
    #[serde(rename = "objType")]
    pub obj_type: Option<String>,
    pub obs_collection: Option<String>,
    #[serde(rename = "previewURL")]
    pub preview_url: Option<String>,
    #[serde(rename = "jpegURL")]
    pub jpeg_url: Option<String>,
    #[serde(rename = "dataURL")]
    pub data_url: Option<String>,
    #[serde(rename = "fitsURL")]
    pub fits_url: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl MastRecord {
    fn position(&self) -> Option<(f64, f64)> {
        [
            (self.s_ra, self.s_dec),
            (self.ra, self.dec),
            (self.ra_targ, self.dec_targ),
        ]
        .into_iter()
        .find_map(|pair| match pair {
            (Some(ra), Some(dec)) if ra.is_finite() && is_valid_dec(dec) => {
                Some((normalize_ra(ra), dec))
            }
            _ => None,
        })
    }

    fn identifier(&self) -> Option<String> {
        [&self.obsid, &self.obs_id, &self.obj_id]
            .into_iter()
            .flatten()
            .map(|id| id.to_string())
            .find(|id| !id.trim().is_empty())
            .or_else(|| non_empty(&self.target_name))
    }

    /// Map to the provider-neutral summary, or `None` when the record has no
    /// identifier or no valid position.
    pub fn normalize(&self, category: Category) -> Option<ObjectSummary> {
        let id = self.identifier()?;
        let (ra, dec) = self.position()?;
        let name = non_empty(&self.target_name)
            .or_else(|| non_empty(&self.title))
            .unwrap_or_else(|| id.clone());
        let is_hst = self
            .obs_collection
            .as_deref()
            .is_some_and(|c| c.to_lowercase().contains("hst"));
        let source = if is_hst { "nasa:hst" } else { "nasa:mast" };

        let mut summary = ObjectSummary::new(id, name, category, ra, dec, source);
        summary.magnitude = self.mag;
        summary.redshift = self.redshift;
        summary.object_type = non_empty(&self.obj_type).or_else(|| non_empty(&self.obs_collection));
        summary.thumb_url = non_empty(&self.preview_url).or_else(|| non_empty(&self.jpeg_url));
        summary.preview_url = non_empty(&self.data_url)
            .or_else(|| non_empty(&self.fits_url))
            .or_else(|| summary.thumb_url.clone());
        Some(summary)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Wrapped { results: Vec<MastRecord> },
    Bare(Vec<MastRecord>),
}

impl SearchResponse {
    fn into_records(self) -> Vec<MastRecord> {
        match self {
            SearchResponse::Wrapped { results } => results,
            SearchResponse::Bare(records) => records,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ObservationResponse {
    Many(Vec<MastRecord>),
    Wrapped { observation: MastRecord },
    Single(MastRecord),
}

impl ObservationResponse {
    fn into_record(self) -> Option<MastRecord> {
        match self {
            ObservationResponse::Many(records) => records.into_iter().next(),
            ObservationResponse::Wrapped { observation } => Some(observation),
            ObservationResponse::Single(record) => Some(record),
        }
    }
}

/// Adapter over the MAST portal search and observation endpoints.
#[derive(Debug, Clone)]
pub struct MastAdapter {
    client: reqwest::Client,
    base_url: String,
    retries: u32,
    retry_delay: Duration,
    timeout: Duration,
}

impl MastAdapter {
    pub const ID: &'static str = "nasa-hubble";

    /// # Arguments
    /// * `settings` - Base URL and retry policy
    /// * `timeout` - Per-request HTTP timeout
    pub fn new(settings: &MastSettings, timeout: Duration) -> AdapterResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdapterError::Unavailable(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            retries: settings.retries,
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
            timeout,
        })
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> AdapterResult<T> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdapterError::Timeout(self.timeout)
                } else {
                    AdapterError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AdapterError::Decode(e.to_string()))
    }

    /// GET with linear backoff on retryable failures.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> AdapterResult<T> {
        let mut attempt = 0;
        loop {
            match self.get_once(url, params).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.retries => {
                    attempt += 1;
                    let delay = self.retry_delay * attempt;
                    debug!("MAST request failed ({}), retry {} in {:?}", err, attempt, delay);
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl CatalogAdapter for MastAdapter {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn search_by_category(
        &self,
        category: Category,
        bbox: Option<BoundingBox>,
        page: u32,
        limit: u32,
    ) -> AdapterResult<AdapterPage> {
        let mut params = vec![
            ("q", portal_term(category).to_string()),
            ("page", page.to_string()),
            ("pagesize", limit.to_string()),
        ];
        if let Some(bbox) = &bbox {
            // coarse cone around the box; results are filtered precisely below
            let center = bbox.center();
            let half_ra = bbox.ra_span() / 2.0;
            let half_dec = (bbox.max_dec.value() - bbox.min_dec.value()) / 2.0;
            let radius = half_ra.hypot(half_dec).max(0.01);
            params.push(("ra", format!("{:.6}", center.ra_deg())));
            params.push(("dec", format!("{:.6}", center.dec_deg())));
            params.push(("radius", format!("{:.4}", radius)));
        }

        let url = format!("{}/portal/search", self.base_url);
        let response: SearchResponse = self.get_json(&url, &params).await?;
        let records = response.into_records();
        let raw = records.len();

        let items: Vec<ObjectSummary> = records
            .iter()
            .filter_map(|record| record.normalize(category))
            .collect();
        if items.len() < raw {
            warn!(
                "Dropped {} MAST records without id or coordinates",
                raw - items.len()
            );
        }
        let items = match &bbox {
            Some(bbox) => filter_by_bbox(items, bbox),
            None => items,
        };
        let total = items.len();
        let items = items.into_iter().take(limit as usize).collect();
        Ok(AdapterPage::new(items, Some(total)))
    }

    async fn get_by_id(&self, id: &str) -> AdapterResult<Option<ObjectSummary>> {
        let url = format!("{}/portal/observation", self.base_url);
        let params = [("obsid", id.to_string())];
        let response: ObservationResponse = self.get_json(&url, &params).await?;
        Ok(response
            .into_record()
            .and_then(|record| record.normalize(Category::Others)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_prefers_primary_fields() {
        let record: MastRecord = serde_json::from_value(json!({
            "obsid": 2003520266u64,
            "obs_id": "hst_12345",
            "target_name": "ANDROMEDA",
            "s_ra": 10.68,
            "s_dec": 41.27,
            "ra": 1.0,
            "dec": 1.0,
            "obs_collection": "HST",
            "jpegURL": "https://example.org/t.jpg"
        }))
        .unwrap();

        let item = record.normalize(Category::Galaxies).unwrap();
        assert_eq!(item.id, "2003520266");
        assert_eq!(item.name, "ANDROMEDA");
        assert_eq!(item.ra_deg(), 10.68);
        assert_eq!(item.dec_deg(), 41.27);
        assert_eq!(item.source, "nasa:hst");
        assert_eq!(item.object_type.as_deref(), Some("HST"));
        assert_eq!(item.thumb_url.as_deref(), Some("https://example.org/t.jpg"));
        assert_eq!(item.preview_url, item.thumb_url);
    }

    #[test]
    fn test_normalize_falls_back_through_position_fields() {
        let record = MastRecord {
            obs_id: Some(RecordId::Text("x1".into())),
            ra_targ: Some(-10.0),
            dec_targ: Some(5.0),
            obs_collection: Some("JWST".into()),
            ..MastRecord::default()
        };
        let item = record.normalize(Category::Stars).unwrap();
        assert_eq!(item.ra_deg(), 350.0);
        assert_eq!(item.name, "x1");
        assert_eq!(item.source, "nasa:mast");
    }

    #[test]
    fn test_records_without_coordinates_are_dropped() {
        let record = MastRecord {
            obsid: Some(RecordId::Text("1".into())),
            target_name: Some("M31".into()),
            s_ra: Some(10.0),
            ..MastRecord::default()
        };
        assert!(record.normalize(Category::Galaxies).is_none());

        let bad_dec = MastRecord {
            obsid: Some(RecordId::Text("2".into())),
            s_ra: Some(10.0),
            s_dec: Some(120.0),
            ..MastRecord::default()
        };
        assert!(bad_dec.normalize(Category::Galaxies).is_none());

        let no_id = MastRecord {
            s_ra: Some(10.0),
            s_dec: Some(10.0),
            ..MastRecord::default()
        };
        assert!(no_id.normalize(Category::Galaxies).is_none());
    }

    #[test]
    fn test_response_envelopes() {
        let wrapped: SearchResponse =
            serde_json::from_value(json!({"results": [{"obsid": "a", "ra": 1.0, "dec": 2.0}]}))
                .unwrap();
        assert_eq!(wrapped.into_records().len(), 1);

        let bare: SearchResponse = serde_json::from_value(json!([{}, {}])).unwrap();
        assert_eq!(bare.into_records().len(), 2);

        let single: ObservationResponse =
            serde_json::from_value(json!({"observation": {"obsid": "z"}})).unwrap();
        assert_eq!(
            single.into_record().unwrap().obsid,
            Some(RecordId::Text("z".into()))
        );

        let empty: ObservationResponse = serde_json::from_value(json!([])).unwrap();
        assert!(empty.into_record().is_none());
    }

    #[test]
    fn test_portal_terms() {
        assert_eq!(portal_term(Category::Planets), "exoplanet");
        assert_eq!(portal_term(Category::Moons), "star");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_request_error() {
        let settings = MastSettings {
            enabled: true,
            base_url: "http://127.0.0.1:9".to_string(),
            retries: 0,
            retry_delay_ms: 1,
        };
        let adapter = MastAdapter::new(&settings, Duration::from_secs(2)).unwrap();
        let err = adapter
            .search_by_category(Category::Stars, None, 1, 10)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdapterError::Request(_) | AdapterError::Timeout(_)
        ));
    }
}
