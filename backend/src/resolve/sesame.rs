//! CDS Sesame client.
//!
//! Sesame answers `GET <base>?<name>` with a plain-text record. Only two
//! lines matter here:
//!
//! - `%J <ra> <dec>`: J2000 position in decimal degrees
//! - `%C.0 <type>`: object type, e.g. `G` or `PN`
//!
//! A body without a `%J` line is a miss.

use async_trait::async_trait;
use log::debug;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use super::{NameResolver, NamedObject};
use crate::adapters::{AdapterError, AdapterResult};
use crate::config::SesameSettings;
use crate::models::SkyCoordinate;

static SESAME_COORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%J\s+([\d.]+)\s+([-+]?[\d.]+)").expect("sesame position pattern compiles")
});

static SESAME_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%C\.0[ \t]+([^\n]+)").expect("sesame type pattern compiles"));

/// Extract the position and object type from a Sesame response body.
///
/// Returns `None` when there is no `%J` line or its position is out of range.
/// A missing or blank `%C.0` line leaves `object_type` empty.
pub fn parse_sesame(body: &str) -> Option<NamedObject> {
    let caps = SESAME_COORDS_RE.captures(body)?;
    let ra: f64 = caps[1].parse().ok()?;
    let dec: f64 = caps[2].parse().ok()?;
    let coordinate = SkyCoordinate::new(ra, dec).ok()?;

    let object_type = SESAME_TYPE_RE
        .captures(body)
        .map(|c| c[1].trim().to_string())
        .filter(|t| !t.is_empty());

    Some(NamedObject {
        coordinate,
        object_type,
    })
}

/// Characters that would split or reinterpret the bare query string.
fn escape_query(name: &str) -> String {
    name.replace('%', "%25")
        .replace('+', "%2B")
        .replace('&', "%26")
        .replace('=', "%3D")
}

/// [`NameResolver`] backed by the CDS Sesame service.
#[derive(Debug, Clone)]
pub struct SesameResolver {
    client: reqwest::Client,
    base_url: reqwest::Url,
    retries: u32,
    retry_delay: Duration,
    timeout: Duration,
}

impl SesameResolver {
    pub fn new(settings: &SesameSettings) -> AdapterResult<Self> {
        let base_url = reqwest::Url::parse(settings.base_url.trim()).map_err(|e| {
            AdapterError::Unavailable(format!("Sesame URL {:?}: {}", settings.base_url, e))
        })?;
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(concat!("sky-catalog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AdapterError::Unavailable(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            retries: settings.retries,
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
            timeout: settings.timeout(),
        })
    }

    /// Request URL for `name`, e.g. `.../nph-sesame/-oI/A?M31`.
    pub fn url_for(&self, name: &str) -> reqwest::Url {
        let mut url = self.base_url.clone();
        url.set_query(Some(&escape_query(name)));
        url
    }

    async fn fetch_once(&self, name: &str) -> AdapterResult<String> {
        let response = self
            .client
            .get(self.url_for(name))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdapterError::Timeout(self.timeout)
                } else {
                    AdapterError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| AdapterError::Decode(e.to_string()))
    }

    async fn fetch(&self, name: &str) -> AdapterResult<String> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(name).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_retryable() && attempt < self.retries => {
                    attempt += 1;
                    let delay = self.retry_delay * attempt;
                    debug!("Sesame request failed ({}), retry {} in {:?}", err, attempt, delay);
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl NameResolver for SesameResolver {
    async fn lookup(&self, name: &str) -> AdapterResult<Option<NamedObject>> {
        let body = self.fetch(name).await?;
        let found = parse_sesame(&body);
        if found.is_none() {
            debug!("Sesame has no position for {:?}", name);
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const M31_RESPONSE: &str = "\
# M31\t#Q1234567
#=Sc=Simbad (CDS, via client/cache):    1    8ms
%@ 1575544
%I.0 M 31
%C.0 G
%J 10.684708 +41.268750 = 00:42:44.32 +41:16:07.5
%J.E [1.1 1.2 90] B 2006AJ....131.1163S
%V z -0.001004 [0.000010] D 1991RC3.9.C...0000d
";

    #[test]
    fn test_parse_hit() {
        let found = parse_sesame(M31_RESPONSE).unwrap();
        assert!((found.coordinate.ra_deg() - 10.684708).abs() < 1e-9);
        assert!((found.coordinate.dec_deg() - 41.26875).abs() < 1e-9);
        assert_eq!(found.object_type.as_deref(), Some("G"));
    }

    #[test]
    fn test_parse_without_position_is_a_miss() {
        let body = "# Nonexistent Object\n#! *** Nothing found *** \n";
        assert!(parse_sesame(body).is_none());
        assert!(parse_sesame("").is_none());
    }

    #[test]
    fn test_parse_without_type() {
        let body = "# Sgr A*\n%J 266.41683 -29.00781 = 17:45:40.04 -29:00:28.1\n";
        let found = parse_sesame(body).unwrap();
        assert!((found.coordinate.dec_deg() + 29.00781).abs() < 1e-9);
        assert_eq!(found.object_type, None);

        let blank = "%C.0   \n%J 83.82208 -5.39111\n";
        assert_eq!(parse_sesame(blank).unwrap().object_type, None);
    }

    #[test]
    fn test_parse_rejects_out_of_range_position() {
        assert!(parse_sesame("%J 12.0 +95.0\n").is_none());
    }

    #[test]
    fn test_url_for_escapes_reserved_characters() {
        let resolver = SesameResolver::new(&SesameSettings::default()).unwrap();
        assert_eq!(
            resolver.url_for("M31").as_str(),
            "https://cdsweb.u-strasbg.fr/cgi-bin/nph-sesame/-oI/A?M31"
        );
        assert_eq!(resolver.url_for("BD+40 4124").query(), Some("BD%2B40%204124"));
    }

    #[test]
    fn test_bad_base_url_is_unavailable() {
        let settings = SesameSettings {
            base_url: "not a url".to_string(),
            ..SesameSettings::default()
        };
        let err = SesameResolver::new(&settings).unwrap_err();
        assert!(matches!(err, AdapterError::Unavailable(_)));
    }
}
