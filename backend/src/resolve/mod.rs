//! Turn free-form user text into a sky position to centre the view on.
//!
//! Resolution order:
//! 1. explicit coordinates (decimal, sexagesimal or lettered)
//! 2. an optional external [`NameResolver`]
//! 3. the built-in landmark tables

mod keywords;
#[cfg(feature = "sesame")]
mod sesame;

use async_trait::async_trait;
use log::{debug, warn};
use serde::Serialize;
use std::sync::Arc;

use crate::adapters::AdapterResult;
use crate::cache::{cache_key, Clock, SystemClock, TtlCache};
use crate::config::ResolverSettings;
use crate::coords::{format_coordinates, parse_free_text};
use crate::error::{CatalogError, CatalogResult};
use crate::models::SkyCoordinate;

pub use keywords::lookup_keywords;
#[cfg(feature = "sesame")]
pub use sesame::{parse_sesame, SesameResolver};

/// Longest accepted query, in characters, after trimming.
pub const MAX_QUERY_LEN: usize = 500;

/// Field of view used when the query was a bare coordinate pair.
pub const COORDINATE_FOV: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    Coords,
    Object,
    SolarSystem,
    Keywords,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    #[serde(rename = "type")]
    pub kind: ResolutionKind,
    #[serde(flatten)]
    pub coordinate: SkyCoordinate,
    /// Suggested field of view in degrees.
    pub fov: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A hit from an external name service.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedObject {
    pub coordinate: SkyCoordinate,
    pub object_type: Option<String>,
}

/// Object-name lookup, such as the CDS Sesame client.
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn lookup(&self, name: &str) -> AdapterResult<Option<NamedObject>>;
}

/// Suggested field of view in degrees for a given object type.
pub fn fov_for_object_type(object_type: &str) -> f64 {
    let t = object_type.to_lowercase();
    if t.contains("nebula") || t.contains("neb") {
        3.0
    } else if t.contains("galaxy") || t.contains("gal") {
        1.0
    } else if t.contains("cluster") || t.contains("cl") {
        2.0
    } else if t.contains("star") {
        0.5
    } else {
        2.0
    }
}

pub struct QueryResolver {
    names: Option<Arc<dyn NameResolver>>,
    cache: TtlCache<String, Resolution>,
}

impl std::fmt::Debug for QueryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResolver")
            .field("has_name_resolver", &self.names.is_some())
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl Default for QueryResolver {
    fn default() -> Self {
        Self::new(&ResolverSettings::default())
    }
}

impl QueryResolver {
    pub fn new(settings: &ResolverSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: &ResolverSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            names: None,
            cache: TtlCache::with_clock(settings.cache_capacity, settings.ttl(), clock),
        }
    }

    pub fn with_name_resolver(mut self, names: Arc<dyn NameResolver>) -> Self {
        self.names = Some(names);
        self
    }

    pub fn cache(&self) -> &TtlCache<String, Resolution> {
        &self.cache
    }

    /// Resolve `text` to a position.
    ///
    /// # Returns
    /// `Ok(None)` when nothing matched; a validation error when the trimmed
    /// text is empty or longer than [`MAX_QUERY_LEN`] characters.
    pub async fn resolve(&self, text: &str) -> CatalogResult<Option<Resolution>> {
        let query = text.trim();
        let len = query.chars().count();
        if len == 0 {
            return Err(CatalogError::invalid_field("q", "query must not be empty"));
        }
        if len > MAX_QUERY_LEN {
            return Err(CatalogError::invalid_field(
                "q",
                format!("query longer than {} characters", MAX_QUERY_LEN),
            ));
        }

        let key = cache_key("resolve", [("q", query.to_lowercase())]);
        if let Some(hit) = self.cache.get(&key) {
            debug!("resolve cache hit for {:?}", query);
            return Ok(Some(hit));
        }

        let resolved = match parse_free_text(query) {
            Some(coordinate) => Some(Resolution {
                kind: ResolutionKind::Coords,
                coordinate,
                fov: COORDINATE_FOV,
                name: None,
                note: Some(format_coordinates(&coordinate)),
            }),
            None => match self.lookup_name(query).await {
                Some(hit) => Some(hit),
                None => lookup_keywords(query),
            },
        };

        if let Some(hit) = &resolved {
            self.cache.set(key, hit.clone());
        }
        Ok(resolved)
    }

    async fn lookup_name(&self, query: &str) -> Option<Resolution> {
        let names = self.names.as_ref()?;
        match names.lookup(query).await {
            Ok(Some(found)) => {
                let object_type = found.object_type.as_deref().unwrap_or("Unknown");
                Some(Resolution {
                    kind: ResolutionKind::Object,
                    coordinate: found.coordinate,
                    fov: fov_for_object_type(object_type),
                    name: Some(query.to_string()),
                    note: Some(format!("{} ({})", query, object_type)),
                })
            }
            Ok(None) => None,
            Err(err) => {
                warn!("name lookup for {:?} failed: {}", query, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::AdapterError;
    use crate::cache::ManualClock;
    use parking_lot::Mutex;
    use std::time::Duration;

    struct ScriptedNames {
        answer: AdapterResult<Option<NamedObject>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedNames {
        fn new(answer: AdapterResult<Option<NamedObject>>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl NameResolver for ScriptedNames {
        async fn lookup(&self, name: &str) -> AdapterResult<Option<NamedObject>> {
            self.calls.lock().push(name.to_string());
            self.answer.clone()
        }
    }

    fn m31() -> NamedObject {
        NamedObject {
            coordinate: SkyCoordinate::new(10.6847083, 41.26875).unwrap(),
            object_type: Some("Galaxy".to_string()),
        }
    }

    #[test]
    fn test_fov_for_object_type() {
        assert_eq!(fov_for_object_type("Planetary Nebula"), 3.0);
        assert_eq!(fov_for_object_type("Galaxy"), 1.0);
        assert_eq!(fov_for_object_type("Open Cluster"), 2.0);
        assert_eq!(fov_for_object_type("Star"), 0.5);
        assert_eq!(fov_for_object_type("Pulsar"), 2.0);
    }

    #[tokio::test]
    async fn test_coordinates_take_precedence() {
        let names = ScriptedNames::new(Ok(Some(m31())));
        let resolver = QueryResolver::default().with_name_resolver(names.clone());

        let hit = resolver.resolve("17:45:40 -28:56:10").await.unwrap().unwrap();
        assert_eq!(hit.kind, ResolutionKind::Coords);
        assert_eq!(hit.fov, COORDINATE_FOV);
        assert_eq!(hit.note.as_deref(), Some("RA 17h 45m 40.0s, Dec -28° 56' 10.0\""));
        assert!(names.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_name_resolver_hit() {
        let names = ScriptedNames::new(Ok(Some(m31())));
        let resolver = QueryResolver::default().with_name_resolver(names);

        let hit = resolver.resolve("M31").await.unwrap().unwrap();
        assert_eq!(hit.kind, ResolutionKind::Object);
        assert_eq!(hit.fov, 1.0);
        assert_eq!(hit.note.as_deref(), Some("M31 (Galaxy)"));
    }

    #[tokio::test]
    async fn test_untyped_name_hit_reads_as_unknown() {
        let names = ScriptedNames::new(Ok(Some(NamedObject {
            object_type: None,
            ..m31()
        })));
        let resolver = QueryResolver::default().with_name_resolver(names);

        let hit = resolver.resolve("M31").await.unwrap().unwrap();
        assert_eq!(hit.kind, ResolutionKind::Object);
        assert_eq!(hit.fov, 2.0);
        assert_eq!(hit.name.as_deref(), Some("M31"));
        assert_eq!(hit.note.as_deref(), Some("M31 (Unknown)"));
    }

    #[tokio::test]
    async fn test_name_resolver_failure_falls_back_to_keywords() {
        let names = ScriptedNames::new(Err(AdapterError::Timeout(Duration::from_secs(5))));
        let resolver = QueryResolver::default().with_name_resolver(names.clone());

        let hit = resolver.resolve("Orion").await.unwrap().unwrap();
        assert_eq!(hit.kind, ResolutionKind::Keywords);
        assert_eq!(names.calls.lock().as_slice(), ["Orion"]);
    }

    #[tokio::test]
    async fn test_without_name_resolver() {
        let resolver = QueryResolver::default();
        let hit = resolver.resolve("tierra").await.unwrap().unwrap();
        assert_eq!(hit.kind, ResolutionKind::SolarSystem);
        assert!(resolver.resolve("M31").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_length_validation() {
        let resolver = QueryResolver::default();
        let err = resolver.resolve("   ").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.context().field.as_deref(), Some("q"));

        let long = "a".repeat(MAX_QUERY_LEN + 1);
        assert!(resolver.resolve(&long).await.unwrap_err().is_validation());
        let max = "a".repeat(MAX_QUERY_LEN);
        assert!(resolver.resolve(&max).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_hits_are_cached_case_insensitively() {
        let clock = Arc::new(ManualClock::new());
        let names = ScriptedNames::new(Ok(Some(m31())));
        let resolver = QueryResolver::with_clock(&ResolverSettings::default(), clock.clone())
            .with_name_resolver(names.clone());

        resolver.resolve("M31").await.unwrap();
        resolver.resolve(" m31 ").await.unwrap();
        assert_eq!(names.calls.lock().len(), 1);

        clock.advance(Duration::from_secs(601));
        resolver.resolve("M31").await.unwrap();
        assert_eq!(names.calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_misses_are_not_cached() {
        let resolver = QueryResolver::default();
        assert!(resolver.resolve("nothing here").await.unwrap().is_none());
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_resolution_json_shape() {
        let hit = lookup_keywords("moon").unwrap();
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["type"], "solar_system");
        assert_eq!(json["fov"], 2.0);
        assert!(json.get("ra").is_some());
        assert!(json.get("dec").is_some());
    }
}
