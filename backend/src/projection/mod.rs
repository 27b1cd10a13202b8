//! Sky ↔ image-plane transforms.
//!
//! Image points are normalized so that `[0,1]²` covers the calibrated image,
//! with `(0.5, 0.5)` at the reference centre, `x` growing with RA offset and
//! `y` growing towards lower declination (image rows run top to bottom).

mod equirectangular;
mod gnomonic;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CatalogError, CatalogResult, ErrorContext};
use crate::models::{
    is_valid_dec, is_valid_ra, normalize_ra, wrap_ra_offset, BoundingBox, ImagePoint,
    SkyCoordinate, Viewport,
};

/// Projection model used to map the sphere onto the image plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionKind {
    /// Tangent-plane projection; accurate near the reference centre.
    #[default]
    Gnomonic,
    /// Linear RA/Dec offsets; degrades away from the equator.
    Equirectangular,
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionKind::Gnomonic => f.write_str("gnomonic"),
            ProjectionKind::Equirectangular => f.write_str("equirectangular"),
        }
    }
}

impl FromStr for ProjectionKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gnomonic" => Ok(ProjectionKind::Gnomonic),
            "equirectangular" => Ok(ProjectionKind::Equirectangular),
            other => Err(CatalogError::invalid_field(
                "projection",
                format!("Unknown projection type: {}", other),
            )),
        }
    }
}

fn default_center_ra() -> f64 {
    10.6847083
}

fn default_center_dec() -> f64 {
    41.26875
}

fn default_pixel_scale_arcsec() -> f64 {
    0.5
}

fn default_width_px() -> u32 {
    20_000
}

fn default_height_px() -> u32 {
    15_000
}

/// Calibration of the image against the sky.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    #[serde(default)]
    pub kind: ProjectionKind,
    /// Reference RA at the image centre, degrees
    #[serde(default = "default_center_ra")]
    pub center_ra: f64,
    /// Reference Dec at the image centre, degrees
    #[serde(default = "default_center_dec")]
    pub center_dec: f64,
    #[serde(default = "default_pixel_scale_arcsec")]
    pub pixel_scale_arcsec: f64,
    /// Counter-clockwise rotation of the tangent-plane axes, degrees
    #[serde(default)]
    pub rotation_deg: f64,
    #[serde(default = "default_width_px")]
    pub width_px: u32,
    #[serde(default = "default_height_px")]
    pub height_px: u32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            kind: ProjectionKind::default(),
            center_ra: default_center_ra(),
            center_dec: default_center_dec(),
            pixel_scale_arcsec: default_pixel_scale_arcsec(),
            rotation_deg: 0.0,
            width_px: default_width_px(),
            height_px: default_height_px(),
        }
    }
}

impl ProjectionConfig {
    pub fn validate(&self) -> CatalogResult<()> {
        let fail = |field: &str, message: String| CatalogError::Configuration {
            message,
            context: ErrorContext::new("projection_config").with_field(field),
        };
        if !is_valid_ra(self.center_ra) {
            return Err(fail(
                "center_ra",
                format!("center_ra {} outside [0, 360)", self.center_ra),
            ));
        }
        if !is_valid_dec(self.center_dec) {
            return Err(fail(
                "center_dec",
                format!("center_dec {} outside [-90, 90]", self.center_dec),
            ));
        }
        if !self.pixel_scale_arcsec.is_finite() || self.pixel_scale_arcsec <= 0.0 {
            return Err(fail(
                "pixel_scale_arcsec",
                format!("pixel scale must be positive, got {}", self.pixel_scale_arcsec),
            ));
        }
        if !self.rotation_deg.is_finite() {
            return Err(fail("rotation_deg", "rotation must be finite".to_string()));
        }
        if self.width_px == 0 || self.height_px == 0 {
            return Err(fail(
                "width_px",
                format!(
                    "image dimensions must be positive, got {}x{}",
                    self.width_px, self.height_px
                ),
            ));
        }
        Ok(())
    }
}

/// Precomputed quantities shared by both projection models.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub ra0: f64,
    pub dec0: f64,
    /// Degrees per pixel
    pub scale_deg: f64,
    pub sin_rot: f64,
    pub cos_rot: f64,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    fn new(config: &ProjectionConfig) -> Self {
        let scale_deg = qtty::Arcseconds::new(config.pixel_scale_arcsec)
            .to::<qtty::Deg>()
            .value();
        let (sin_rot, cos_rot) = config.rotation_deg.to_radians().sin_cos();
        Self {
            ra0: config.center_ra,
            dec0: config.center_dec,
            scale_deg,
            sin_rot,
            cos_rot,
            width: f64::from(config.width_px),
            height: f64::from(config.height_px),
        }
    }

    /// Rotate plane offsets by the configured angle.
    pub fn rotate(&self, u: f64, v: f64) -> (f64, f64) {
        (
            u * self.cos_rot - v * self.sin_rot,
            u * self.sin_rot + v * self.cos_rot,
        )
    }

    /// Inverse of [`Frame::rotate`].
    pub fn unrotate(&self, u: f64, v: f64) -> (f64, f64) {
        (
            u * self.cos_rot + v * self.sin_rot,
            -u * self.sin_rot + v * self.cos_rot,
        )
    }

    /// Plane offsets in degrees (east, north) to a normalized image point.
    pub fn plane_to_image(&self, u_deg: f64, v_deg: f64) -> ImagePoint {
        let px = u_deg / self.scale_deg;
        let py = -v_deg / self.scale_deg;
        ImagePoint::new(0.5 + px / self.width, 0.5 + py / self.height)
    }

    /// Normalized image point to plane offsets in degrees (east, north).
    pub fn image_to_plane(&self, point: ImagePoint) -> (f64, f64) {
        let px = (point.x - 0.5) * self.width;
        let py = (point.y - 0.5) * self.height;
        (px * self.scale_deg, -py * self.scale_deg)
    }
}

/// A calibrated projection between sky coordinates and normalized image points.
#[derive(Debug, Clone)]
pub struct Projection {
    config: ProjectionConfig,
    frame: Frame,
}

impl Default for Projection {
    fn default() -> Self {
        let config = ProjectionConfig::default();
        let frame = Frame::new(&config);
        Self { config, frame }
    }
}

impl Projection {
    pub fn new(config: ProjectionConfig) -> CatalogResult<Self> {
        config.validate()?;
        let frame = Frame::new(&config);
        Ok(Self { config, frame })
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn kind(&self) -> ProjectionKind {
        self.config.kind
    }

    /// Project a sky coordinate onto the image.
    ///
    /// Returns `None` when the gnomonic model cannot represent the point
    /// (on or beyond 90° from the reference centre). The result may fall
    /// outside `[0,1]²` for points off the image.
    pub fn sky_to_image(&self, coord: &SkyCoordinate) -> Option<ImagePoint> {
        match self.config.kind {
            ProjectionKind::Gnomonic => {
                gnomonic::forward(&self.frame, coord.ra_deg(), coord.dec_deg())
            }
            ProjectionKind::Equirectangular => Some(equirectangular::forward(
                &self.frame,
                coord.ra_deg(),
                coord.dec_deg(),
            )),
        }
    }

    /// Inverse of [`Projection::sky_to_image`]. RA is normalized into [0,360).
    pub fn image_to_sky(&self, point: ImagePoint) -> SkyCoordinate {
        let (ra, dec) = match self.config.kind {
            ProjectionKind::Gnomonic => gnomonic::inverse(&self.frame, point),
            ProjectionKind::Equirectangular => equirectangular::inverse(&self.frame, point),
        };
        SkyCoordinate::from_degrees(normalize_ra(ra), dec.clamp(-90.0, 90.0))
    }

    /// Sky bounding box of a viewport, from its top-left and bottom-right corners.
    ///
    /// RA extremes are taken over offsets from the reference centre, so a
    /// viewport straddling RA 0° yields a wrapping box.
    pub fn viewport_to_bbox(&self, viewport: &Viewport) -> BoundingBox {
        let top_left = self.image_to_sky(ImagePoint::new(viewport.x, viewport.y));
        let bottom_right = self.image_to_sky(ImagePoint::new(
            viewport.x + viewport.width,
            viewport.y + viewport.height,
        ));

        let ra0 = self.frame.ra0;
        let off_a = wrap_ra_offset(top_left.ra_deg() - ra0);
        let off_b = wrap_ra_offset(bottom_right.ra_deg() - ra0);
        let min_ra = normalize_ra(ra0 + off_a.min(off_b));
        let max_ra = normalize_ra(ra0 + off_a.max(off_b));

        let min_dec = top_left.dec_deg().min(bottom_right.dec_deg());
        let max_dec = top_left.dec_deg().max(bottom_right.dec_deg());

        BoundingBox::from_degrees(min_ra, min_dec, max_ra, max_dec)
    }
}
