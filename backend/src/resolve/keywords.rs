use super::{Resolution, ResolutionKind};
use crate::models::SkyCoordinate;

struct Landmark {
    aliases: &'static [&'static str],
    name: &'static str,
    ra: f64,
    dec: f64,
    fov: f64,
    note: &'static str,
}

// Matched against the whole query.
const SOLAR_SYSTEM: &[Landmark] = &[
    Landmark {
        aliases: &["solar system", "sistema solar"],
        name: "Solar System",
        ra: 83.818662,
        dec: -5.389679,
        fov: 4.0,
        note: "The Solar System sits in the Orion Arm of the Milky Way",
    },
    Landmark {
        aliases: &["sun", "sol"],
        name: "Sun",
        ra: 266.41683,
        dec: -29.00781,
        fov: 6.0,
        note: "The Sun orbits the Galactic Centre, about 26,000 light-years away",
    },
    Landmark {
        aliases: &["earth", "tierra"],
        name: "Earth",
        ra: 83.818662,
        dec: -5.389679,
        fov: 3.0,
        note: "Earth lies in the Orion Arm, close to the Orion Nebula direction",
    },
    Landmark {
        aliases: &["moon", "luna"],
        name: "Moon",
        ra: 56.869089,
        dec: 24.105313,
        fov: 2.0,
        note: "Pleiades region, often crossed by the Moon",
    },
];

// Matched as substrings, first entry wins.
const MILKY_WAY: &[Landmark] = &[
    Landmark {
        aliases: &["galactic centre", "galactic center", "centro galáctico", "centro galactico"],
        name: "Galactic Centre",
        ra: 266.41683,
        dec: -29.00781,
        fov: 6.0,
        note: "Centre of the Milky Way (Sgr A*)",
    },
    Landmark {
        aliases: &["cygnus x"],
        name: "Cygnus X",
        ra: 308.5,
        dec: 41.0,
        fov: 5.0,
        note: "Massive star-forming region",
    },
    Landmark {
        aliases: &["orion", "orión"],
        name: "Orion Nebula",
        ra: 83.82208,
        dec: -5.39111,
        fov: 1.5,
        note: "Orion Nebula (M42)",
    },
    Landmark {
        aliases: &["dust", "polvo"],
        name: "Galactic dust lanes",
        ra: 266.41683,
        dec: -29.00781,
        fov: 4.0,
        note: "Dense dust lanes towards the galactic core",
    },
    Landmark {
        aliases: &["hii regions", "regiones hii"],
        name: "HII regions",
        ra: 308.5,
        dec: 41.0,
        fov: 5.0,
        note: "Ionized hydrogen around young massive stars",
    },
];

impl Landmark {
    fn resolution(&self, kind: ResolutionKind) -> Option<Resolution> {
        let coordinate = SkyCoordinate::new(self.ra, self.dec).ok()?;
        Some(Resolution {
            kind,
            coordinate,
            fov: self.fov,
            name: Some(self.name.to_string()),
            note: Some(self.note.to_string()),
        })
    }
}

/// Look `query` up in the built-in landmark tables. Solar-system aliases
/// must match the whole (case-insensitive, trimmed) query; Milky Way
/// keywords match anywhere in it.
pub fn lookup_keywords(query: &str) -> Option<Resolution> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    if let Some(hit) = SOLAR_SYSTEM
        .iter()
        .find(|l| l.aliases.iter().any(|a| *a == needle))
    {
        return hit.resolution(ResolutionKind::SolarSystem);
    }

    MILKY_WAY
        .iter()
        .find(|l| l.aliases.iter().any(|a| needle.contains(a)))
        .and_then(|l| l.resolution(ResolutionKind::Keywords))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solar_system_aliases_are_exact() {
        let hit = lookup_keywords("  Sol ").unwrap();
        assert_eq!(hit.kind, ResolutionKind::SolarSystem);
        assert_eq!(hit.name.as_deref(), Some("Sun"));
        assert_eq!(hit.fov, 6.0);

        let moon = lookup_keywords("luna").unwrap();
        assert!((moon.coordinate.ra_deg() - 56.869089).abs() < 1e-9);

        // "sun" inside a longer phrase is not an alias hit
        assert!(lookup_keywords("sunflower galaxy").is_none());
    }

    #[test]
    fn test_milky_way_keywords_match_substrings() {
        let hit = lookup_keywords("show me the Orion nebula").unwrap();
        assert_eq!(hit.kind, ResolutionKind::Keywords);
        assert_eq!(hit.fov, 1.5);
        assert_eq!(hit.note.as_deref(), Some("Orion Nebula (M42)"));

        let spanish = lookup_keywords("Centro Galáctico").unwrap();
        assert!((spanish.coordinate.dec_deg() + 29.00781).abs() < 1e-9);
    }

    #[test]
    fn test_first_keyword_wins() {
        // both "galactic centre" and "dust" appear
        let hit = lookup_keywords("dust near the galactic centre").unwrap();
        assert_eq!(hit.name.as_deref(), Some("Galactic Centre"));
    }

    #[test]
    fn test_unknown_text() {
        assert!(lookup_keywords("quasar 3C 273").is_none());
        assert!(lookup_keywords("   ").is_none());
    }

    #[test]
    fn test_every_landmark_has_valid_coordinates() {
        for l in SOLAR_SYSTEM.iter().chain(MILKY_WAY) {
            assert!(SkyCoordinate::new(l.ra, l.dec).is_ok(), "{}", l.name);
            assert!(l.aliases.iter().all(|a| *a == a.to_lowercase()));
        }
    }
}
