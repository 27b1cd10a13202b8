//! Coordinate parsing, sexagesimal formatting and great-circle distance.
//!
//! Parsing is pure and never panics: malformed text yields `None` (for free
//! text) or a validation error (for the explicit HMS/DMS helpers).

mod format;
mod parser;

pub use format::{degrees_to_dms, degrees_to_hms, format_coordinates};
pub use parser::{dms_to_degrees, hms_to_degrees, parse_free_text};

pub use crate::models::{is_valid_dec, is_valid_ra};

use crate::models::SkyCoordinate;

/// Great-circle separation in degrees between two raw RA/Dec pairs (haversine).
pub fn angular_separation_deg(ra1: f64, dec1: f64, ra2: f64, dec2: f64) -> f64 {
    let (ra1, dec1, ra2, dec2) = (
        ra1.to_radians(),
        dec1.to_radians(),
        ra2.to_radians(),
        dec2.to_radians(),
    );
    let half_d_dec = (dec2 - dec1) / 2.0;
    let half_d_ra = (ra2 - ra1) / 2.0;
    let a = half_d_dec.sin().powi(2) + dec1.cos() * dec2.cos() * half_d_ra.sin().powi(2);
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();
    c.to_degrees()
}

/// Great-circle separation in degrees between two coordinates.
pub fn angular_separation(a: &SkyCoordinate, b: &SkyCoordinate) -> f64 {
    angular_separation_deg(a.ra_deg(), a.dec_deg(), b.ra_deg(), b.dec_deg())
}
