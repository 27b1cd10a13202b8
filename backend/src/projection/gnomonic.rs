use super::Frame;
use crate::models::ImagePoint;

/// Forward tangent-plane projection. `None` on or beyond the horizon.
pub(crate) fn forward(frame: &Frame, ra: f64, dec: f64) -> Option<ImagePoint> {
    let (sin_dec, cos_dec) = dec.to_radians().sin_cos();
    let (sin_dec0, cos_dec0) = frame.dec0.to_radians().sin_cos();
    let (sin_dra, cos_dra) = (ra - frame.ra0).to_radians().sin_cos();

    let cos_c = sin_dec0 * sin_dec + cos_dec0 * cos_dec * cos_dra;
    if cos_c <= 0.0 {
        return None;
    }

    let xi = cos_dec * sin_dra / cos_c;
    let eta = (cos_dec0 * sin_dec - sin_dec0 * cos_dec * cos_dra) / cos_c;
    let (xi, eta) = frame.rotate(xi, eta);

    Some(frame.plane_to_image(xi.to_degrees(), eta.to_degrees()))
}

/// Inverse tangent-plane projection returning raw `(ra, dec)` in degrees.
pub(crate) fn inverse(frame: &Frame, point: ImagePoint) -> (f64, f64) {
    let (u, v) = frame.image_to_plane(point);
    let (xi, eta) = frame.unrotate(u.to_radians(), v.to_radians());

    let rho = xi.hypot(eta);
    if rho == 0.0 {
        return (frame.ra0, frame.dec0);
    }

    let c = rho.atan();
    let (sin_c, cos_c) = c.sin_cos();
    let (sin_dec0, cos_dec0) = frame.dec0.to_radians().sin_cos();

    let dec = (cos_c * sin_dec0 + eta * sin_c * cos_dec0 / rho)
        .clamp(-1.0, 1.0)
        .asin();
    let dra = (xi * sin_c).atan2(rho * cos_dec0 * cos_c - eta * sin_dec0 * sin_c);

    (frame.ra0 + dra.to_degrees(), dec.to_degrees())
}
