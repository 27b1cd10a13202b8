use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;

/// Fixed set of object-type tags shared by all providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Stars,
    Galaxies,
    Nebulae,
    Clusters,
    Planets,
    Moons,
    Asteroids,
    Comets,
    StarSystems,
    Constellations,
    Others,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Stars,
        Category::Galaxies,
        Category::Nebulae,
        Category::Clusters,
        Category::Planets,
        Category::Moons,
        Category::Asteroids,
        Category::Comets,
        Category::StarSystems,
        Category::Constellations,
        Category::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Stars => "stars",
            Category::Galaxies => "galaxies",
            Category::Nebulae => "nebulae",
            Category::Clusters => "clusters",
            Category::Planets => "planets",
            Category::Moons => "moons",
            Category::Asteroids => "asteroids",
            Category::Comets => "comets",
            Category::StarSystems => "star-systems",
            Category::Constellations => "constellations",
            Category::Others => "others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| {
                CatalogError::invalid_field("category", format!("Invalid category: {}", s))
            })
    }
}

/// Provider-neutral summary of one catalog object.
///
/// Created per request by an adapter, merged into a response, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSummary {
    /// Provider-scoped identifier
    pub id: String,
    pub name: String,
    pub category: Category,
    pub ra: qtty::Degrees,
    pub dec: qtty::Degrees,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redshift: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    /// Provenance tag, e.g. `nasa:hst` or `csa:mock`
    pub source: String,
}

impl ObjectSummary {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        ra: f64,
        dec: f64,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            ra: qtty::Degrees::new(ra),
            dec: qtty::Degrees::new(dec),
            magnitude: None,
            redshift: None,
            object_type: None,
            thumb_url: None,
            preview_url: None,
            source: source.into(),
        }
    }

    pub fn with_magnitude(mut self, magnitude: f64) -> Self {
        self.magnitude = Some(magnitude);
        self
    }

    pub fn with_object_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }

    pub fn ra_deg(&self) -> f64 {
        self.ra.value()
    }

    pub fn dec_deg(&self) -> f64 {
        self.dec.value()
    }

    /// Composite key used to collapse the same object reported by several providers.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}:{}:{:.5},{:.5}",
            self.category,
            self.name,
            self.ra.value(),
            self.dec.value()
        )
    }
}
