//! Bounding-box membership over sky coordinates.
//!
//! Dec is a plain inclusive range. RA is inclusive as well, except that a box
//! with `min_ra > max_ra` wraps across the 0°/360° seam and matches
//! `ra >= min_ra || ra <= max_ra`.

use crate::models::{normalize_ra, BoundingBox, ObjectSummary};

/// Inclusive RA range test honouring seam wraparound.
///
/// A `max_ra` of 360 is the same meridian as 0, so it also admits RA 0.
pub fn ra_in_range(ra: f64, min_ra: f64, max_ra: f64) -> bool {
    if min_ra <= max_ra {
        (ra >= min_ra && ra <= max_ra) || (max_ra >= 360.0 && ra == 0.0)
    } else {
        ra >= min_ra || ra <= max_ra
    }
}

/// Test whether a point lies inside `bbox`.
///
/// RA is normalized into [0,360) before comparison, so 365° matches like 5°.
/// A box spanning `[0, 360]` still contains every RA.
pub fn point_in_bbox(ra: f64, dec: f64, bbox: &BoundingBox) -> bool {
    if !ra.is_finite() || !dec.is_finite() {
        return false;
    }
    let in_dec = dec >= bbox.min_dec.value() && dec <= bbox.max_dec.value();
    in_dec && ra_in_range(normalize_ra(ra), bbox.min_ra.value(), bbox.max_ra.value())
}

/// Order-preserving filter keeping only items inside `bbox`.
pub fn filter_by_bbox(items: Vec<ObjectSummary>, bbox: &BoundingBox) -> Vec<ObjectSummary> {
    items
        .into_iter()
        .filter(|item| point_in_bbox(item.ra_deg(), item.dec_deg(), bbox))
        .collect()
}
