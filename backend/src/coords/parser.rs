use regex::Regex;
use std::sync::LazyLock;

use crate::error::{CatalogError, CatalogResult, ErrorContext};
use crate::models::{is_valid_dec, is_valid_ra, SkyCoordinate};

/// `266.41683 -29.00781` (comma separator also accepted)
static DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?\d+(?:\.\d*)?)(?:\s*,\s*|\s+)([+-]?\d+(?:\.\d*)?)$")
        .expect("decimal pattern compiles")
});

/// `17:45:40 -28:56:10`
static SEXAGESIMAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}:\d{1,2}:\d{1,2}(?:\.\d+)?)\s+([+-]?\d{1,3}:\d{1,2}:\d{1,2}(?:\.\d+)?)$")
        .expect("sexagesimal pattern compiles")
});

/// `17h45m40s -28d56m10s`
static LETTERED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\d{1,2})h(\d{1,2})m(\d{1,2}(?:\.\d+)?)s\s+([+-]?)(\d{1,3})d(\d{1,2})m(\d{1,2}(?:\.\d+)?)s$",
    )
    .expect("lettered pattern compiles")
});

fn invalid(operation: &str, message: String) -> CatalogError {
    CatalogError::Validation {
        message,
        context: ErrorContext::new(operation),
    }
}

fn split_three(operation: &str, input: &str) -> CatalogResult<[f64; 3]> {
    let parts = input
        .split(|c: char| c == ':' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(str::parse::<f64>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid(operation, format!("Non-numeric component in '{}'", input)))?;
    match parts.as_slice() {
        [a, b, c] => Ok([*a, *b, *c]),
        _ => Err(invalid(
            operation,
            format!("Expected three components in '{}'", input),
        )),
    }
}

fn hours_to_degrees(hours: f64, minutes: f64, seconds: f64) -> CatalogResult<f64> {
    if !(0.0..24.0).contains(&hours)
        || !(0.0..60.0).contains(&minutes)
        || !(0.0..60.0).contains(&seconds)
    {
        return Err(invalid(
            "hms_to_degrees",
            format!("HMS values out of range: {}h {}m {}s", hours, minutes, seconds),
        ));
    }
    Ok((hours + minutes / 60.0 + seconds / 3600.0) * 15.0)
}

fn signed_degrees(negative: bool, degrees: f64, minutes: f64, seconds: f64) -> CatalogResult<f64> {
    if !(0.0..360.0).contains(&degrees)
        || !(0.0..60.0).contains(&minutes)
        || !(0.0..60.0).contains(&seconds)
    {
        return Err(invalid(
            "dms_to_degrees",
            format!("DMS values out of range: {}d {}m {}s", degrees, minutes, seconds),
        ));
    }
    let magnitude = degrees + minutes / 60.0 + seconds / 3600.0;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Convert `HH:MM:SS[.s]` hour angle to decimal degrees.
///
/// `"17:45:40"` → `266.41667`.
pub fn hms_to_degrees(hms: &str) -> CatalogResult<f64> {
    let [h, m, s] = split_three("hms_to_degrees", hms.trim())?;
    hours_to_degrees(h, m, s)
}

/// Convert `±DD:MM:SS[.s]` to decimal degrees.
///
/// The sign is taken from the text, not from the degree field, so
/// `"-00:30:00"` is `-0.5`.
pub fn dms_to_degrees(dms: &str) -> CatalogResult<f64> {
    let trimmed = dms.trim();
    let negative = trimmed.starts_with('-');
    let unsigned = trimmed.trim_start_matches(['+', '-']);
    let [d, m, s] = split_three("dms_to_degrees", unsigned)?;
    signed_degrees(negative, d, m, s)
}

fn validated(ra: f64, dec: f64) -> Option<SkyCoordinate> {
    if is_valid_ra(ra) && is_valid_dec(dec) {
        Some(SkyCoordinate::from_degrees(ra, dec))
    } else {
        None
    }
}

fn parse_decimal(input: &str) -> Option<SkyCoordinate> {
    let caps = DECIMAL_RE.captures(input)?;
    let ra = caps[1].parse::<f64>().ok()?;
    let dec = caps[2].parse::<f64>().ok()?;
    validated(ra, dec)
}

fn parse_sexagesimal(input: &str) -> Option<SkyCoordinate> {
    let caps = SEXAGESIMAL_RE.captures(input)?;
    let ra = hms_to_degrees(&caps[1]).ok()?;
    let dec = dms_to_degrees(&caps[2]).ok()?;
    validated(ra, dec)
}

fn parse_lettered(input: &str) -> Option<SkyCoordinate> {
    let caps = LETTERED_RE.captures(input)?;
    let num = |i: usize| caps[i].parse::<f64>().ok();
    let ra = hours_to_degrees(num(1)?, num(2)?, num(3)?).ok()?;
    let dec = signed_degrees(&caps[4] == "-", num(5)?, num(6)?, num(7)?).ok()?;
    validated(ra, dec)
}

/// Parse a free-text coordinate query.
///
/// Tries, in order, a signed decimal pair, `HH:MM:SS ±DD:MM:SS`, and
/// `HhMmSs ±DdMmSs`. Returns `None` when nothing matches or the parsed values
/// fall outside RA [0,360) / Dec [-90,90], so callers can fall through to name
/// or keyword resolution.
pub fn parse_free_text(input: &str) -> Option<SkyCoordinate> {
    let cleaned = input.trim();
    parse_decimal(cleaned)
        .or_else(|| parse_sexagesimal(cleaned))
        .or_else(|| parse_lettered(cleaned))
}
