use super::Frame;
use crate::models::{wrap_ra_offset, ImagePoint};

/// Linear projection of RA/Dec offsets from the reference centre.
pub(crate) fn forward(frame: &Frame, ra: f64, dec: f64) -> ImagePoint {
    let d_ra = wrap_ra_offset(ra - frame.ra0);
    let d_dec = dec - frame.dec0;
    let (u, v) = frame.rotate(d_ra, d_dec);
    frame.plane_to_image(u, v)
}

pub(crate) fn inverse(frame: &Frame, point: ImagePoint) -> (f64, f64) {
    let (u, v) = frame.image_to_plane(point);
    let (d_ra, d_dec) = frame.unrotate(u, v);
    (frame.ra0 + d_ra, frame.dec0 + d_dec)
}
