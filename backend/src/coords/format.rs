use crate::models::{normalize_ra, SkyCoordinate};

/// Split a non-negative value into whole units, minutes and rounded seconds,
/// carrying so that seconds never render as `60`.
fn split_sexagesimal(value: f64, decimals: i32) -> (u32, u32, f64) {
    let scale = 10f64.powi(decimals);
    let total_seconds = (value * 3600.0 * scale).round() / scale;
    let mut whole = (total_seconds / 3600.0).floor();
    let mut minutes = ((total_seconds - whole * 3600.0) / 60.0).floor();
    let mut seconds = ((total_seconds - whole * 3600.0 - minutes * 60.0) * scale).round() / scale;
    if seconds >= 60.0 {
        seconds -= 60.0;
        minutes += 1.0;
    }
    if minutes >= 60.0 {
        minutes -= 60.0;
        whole += 1.0;
    }
    (whole as u32, minutes as u32, seconds.max(0.0))
}

/// Render an RA in degrees as `HH:MM:SS.ss`.
pub fn degrees_to_hms(degrees: f64) -> String {
    let (h, m, s) = split_sexagesimal(normalize_ra(degrees) / 15.0, 2);
    format!("{:02}:{:02}:{:05.2}", h % 24, m, s)
}

/// Render a Dec in degrees as `±DD:MM:SS.ss`.
pub fn degrees_to_dms(degrees: f64) -> String {
    let sign = if degrees < 0.0 { '-' } else { '+' };
    let (d, m, s) = split_sexagesimal(degrees.abs(), 2);
    format!("{}{:02}:{:02}:{:05.2}", sign, d, m, s)
}

/// Human-readable label, e.g. `RA 17h 45m 40.0s, Dec -28° 56' 10.0"`.
/// Positive declinations carry an explicit `+`.
pub fn format_coordinates(coord: &SkyCoordinate) -> String {
    let (h, rm, rs) = split_sexagesimal(normalize_ra(coord.ra_deg()) / 15.0, 1);
    let dec = coord.dec_deg();
    let sign = if dec < 0.0 { '-' } else { '+' };
    let (d, dm, ds) = split_sexagesimal(dec.abs(), 1);
    format!(
        "RA {}h {}m {:.1}s, Dec {}{}° {}' {:.1}\"",
        h % 24,
        rm,
        rs,
        sign,
        d,
        dm,
        ds
    )
}
