use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult, ErrorContext};

/// Wrap a right ascension into [0, 360).
pub fn normalize_ra(ra: f64) -> f64 {
    let wrapped = ra.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Wrap an RA difference into [-180, 180).
pub fn wrap_ra_offset(delta: f64) -> f64 {
    (delta + 180.0).rem_euclid(360.0) - 180.0
}

/// Right ascension must lie in [0, 360).
pub fn is_valid_ra(ra: f64) -> bool {
    ra.is_finite() && (0.0..360.0).contains(&ra)
}

/// Declination must lie in [-90, 90].
pub fn is_valid_dec(dec: f64) -> bool {
    dec.is_finite() && (-90.0..=90.0).contains(&dec)
}

/// A validated equatorial position on the celestial sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyCoordinate {
    pub ra: qtty::Degrees,
    pub dec: qtty::Degrees,
}

impl SkyCoordinate {
    /// Create a coordinate, rejecting RA outside [0,360) or Dec outside [-90,90].
    pub fn new(ra: f64, dec: f64) -> CatalogResult<Self> {
        if !is_valid_ra(ra) {
            return Err(CatalogError::invalid_field(
                "ra",
                format!("RA {} outside [0, 360)", ra),
            ));
        }
        if !is_valid_dec(dec) {
            return Err(CatalogError::invalid_field(
                "dec",
                format!("Dec {} outside [-90, 90]", dec),
            ));
        }
        Ok(Self::from_degrees(ra, dec))
    }

    /// Create a coordinate after wrapping RA into [0,360). Dec is still validated.
    pub fn normalized(ra: f64, dec: f64) -> CatalogResult<Self> {
        if !ra.is_finite() {
            return Err(CatalogError::invalid_field("ra", "RA must be finite"));
        }
        Self::new(normalize_ra(ra), dec)
    }

    pub(crate) fn from_degrees(ra: f64, dec: f64) -> Self {
        Self {
            ra: qtty::Degrees::new(ra),
            dec: qtty::Degrees::new(dec),
        }
    }

    pub fn ra_deg(&self) -> f64 {
        self.ra.value()
    }

    pub fn dec_deg(&self) -> f64 {
        self.dec.value()
    }
}

/// Rectangular sky region in RA/Dec.
///
/// `min_ra > max_ra` is a legal state: the box wraps across the 0°/360° seam.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(rename = "minRA")]
    pub min_ra: qtty::Degrees,
    #[serde(rename = "minDec")]
    pub min_dec: qtty::Degrees,
    #[serde(rename = "maxRA")]
    pub max_ra: qtty::Degrees,
    #[serde(rename = "maxDec")]
    pub max_dec: qtty::Degrees,
}

impl BoundingBox {
    /// Create a bounding box. Argument order follows the `minRA,minDec,maxRA,maxDec`
    /// query-string form.
    pub fn new(min_ra: f64, min_dec: f64, max_ra: f64, max_dec: f64) -> CatalogResult<Self> {
        let ctx = || ErrorContext::new("bounding_box");
        for (field, value) in [("minRA", min_ra), ("maxRA", max_ra)] {
            if !value.is_finite() || !(0.0..=360.0).contains(&value) {
                return Err(CatalogError::Validation {
                    message: format!("{} {} outside [0, 360]", field, value),
                    context: ctx().with_field(field),
                });
            }
        }
        for (field, value) in [("minDec", min_dec), ("maxDec", max_dec)] {
            if !is_valid_dec(value) {
                return Err(CatalogError::Validation {
                    message: format!("{} {} outside [-90, 90]", field, value),
                    context: ctx().with_field(field),
                });
            }
        }
        if min_dec > max_dec {
            return Err(CatalogError::Validation {
                message: format!("minDec {} greater than maxDec {}", min_dec, max_dec),
                context: ctx().with_field("minDec"),
            });
        }
        Ok(Self::from_degrees(min_ra, min_dec, max_ra, max_dec))
    }

    pub(crate) fn from_degrees(min_ra: f64, min_dec: f64, max_ra: f64, max_dec: f64) -> Self {
        Self {
            min_ra: qtty::Degrees::new(min_ra),
            min_dec: qtty::Degrees::new(min_dec),
            max_ra: qtty::Degrees::new(max_ra),
            max_dec: qtty::Degrees::new(max_dec),
        }
    }

    /// The whole celestial sphere.
    pub fn full_sky() -> Self {
        Self::from_degrees(0.0, -90.0, 360.0, 90.0)
    }

    /// Parse the `minRA,minDec,maxRA,maxDec` form used in query strings.
    pub fn parse(input: &str) -> CatalogResult<Self> {
        let values = input
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CatalogError::Validation {
                message: format!("Invalid bbox '{}': {}", input, e),
                context: ErrorContext::new("parse_bbox").with_field("bbox"),
            })?;

        match values.as_slice() {
            [min_ra, min_dec, max_ra, max_dec] => {
                Self::new(*min_ra, *min_dec, *max_ra, *max_dec)
                    .map_err(|e| e.with_operation("parse_bbox"))
            }
            _ => Err(CatalogError::Validation {
                message: format!("Invalid bbox '{}': expected 4 comma-separated values", input),
                context: ErrorContext::new("parse_bbox").with_field("bbox"),
            }),
        }
    }

    /// True when the box crosses the 0°/360° seam.
    pub fn wraps(&self) -> bool {
        self.min_ra.value() > self.max_ra.value()
    }

    /// Width in RA, accounting for the seam.
    pub fn ra_span(&self) -> f64 {
        let span = self.max_ra.value() - self.min_ra.value();
        if self.wraps() {
            span + 360.0
        } else {
            span
        }
    }

    /// Geometric centre of the box.
    pub fn center(&self) -> SkyCoordinate {
        let ra = normalize_ra(self.min_ra.value() + self.ra_span() / 2.0);
        let dec = (self.min_dec.value() + self.max_dec.value()) / 2.0;
        SkyCoordinate::from_degrees(ra, dec)
    }

    /// Membership test, see [`crate::spatial::point_in_bbox`].
    pub fn contains(&self, ra: f64, dec: f64) -> bool {
        crate::spatial::point_in_bbox(ra, dec, self)
    }

    /// Stable 5-decimal rendering used in cache keys.
    pub fn cache_key(&self) -> String {
        format!(
            "{:.5},{:.5},{:.5},{:.5}",
            self.min_ra.value(),
            self.min_dec.value(),
            self.max_ra.value(),
            self.max_dec.value()
        )
    }
}

/// A point in normalized image coordinates; [0,1]² covers the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImagePoint {
    pub x: f64,
    pub y: f64,
}

impl ImagePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A rectangle in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}
