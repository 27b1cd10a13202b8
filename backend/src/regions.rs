//! Resolve a sky position to the most specific named region.
//!
//! Regions are RA/Dec rectangles (which may wrap across RA 0°) with an integer
//! priority. Among all rectangles containing a point, the highest priority
//! wins; a full-sky catch-all guarantees that every lookup returns a region.

use serde::Serialize;

use crate::models::{normalize_ra, BoundingBox};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub name: String,
    pub description: String,
    pub bounds: BoundingBox,
    pub priority: i32,
}

impl Region {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        bounds: BoundingBox,
        priority: i32,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            bounds,
            priority,
        }
    }

    /// The lowest-priority full-sky region.
    pub fn catch_all() -> Self {
        Self::new("Milky Way", "Our galaxy", BoundingBox::full_sky(), i32::MIN)
    }

    pub fn contains(&self, ra: f64, dec: f64) -> bool {
        self.bounds.contains(ra, dec)
    }

    fn covers_full_sky(&self) -> bool {
        let b = &self.bounds;
        b.min_ra.value() <= 0.0
            && b.max_ra.value() >= 360.0
            && b.min_dec.value() <= -90.0
            && b.max_dec.value() >= 90.0
    }

    /// One-line label, e.g. `"Orion Complex - Giant star-forming region (M42, M43, Horsehead)"`.
    pub fn context(&self) -> String {
        format!("{} - {}", self.name, self.description)
    }
}

#[derive(Debug, Clone)]
pub struct RegionResolver {
    regions: Vec<Region>,
    fallback: usize,
}

impl Default for RegionResolver {
    fn default() -> Self {
        Self::milky_way()
    }
}

impl RegionResolver {
    /// Build a resolver over `regions`, appending [`Region::catch_all`] unless
    /// the table already has a full-sky entry.
    pub fn new(mut regions: Vec<Region>) -> Self {
        let fallback = match regions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.covers_full_sky())
            .min_by_key(|(_, r)| r.priority)
        {
            Some((idx, _)) => idx,
            None => {
                regions.push(Region::catch_all());
                regions.len() - 1
            }
        };
        Self { regions, fallback }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Find the highest-priority region containing the point. Never fails;
    /// ties go to the region listed first.
    pub fn find_region(&self, ra: f64, dec: f64) -> &Region {
        let ra = normalize_ra(ra);
        let mut best: Option<&Region> = None;
        for region in &self.regions {
            if !region.contains(ra, dec) {
                continue;
            }
            if best.map_or(true, |b| region.priority > b.priority) {
                best = Some(region);
            }
        }
        best.unwrap_or(&self.regions[self.fallback])
    }

    /// Default table of prominent Milky Way and Local Group regions.
    pub fn milky_way() -> Self {
        let r = |name: &str, desc: &str, min_ra, max_ra, min_dec, max_dec, priority| {
            Region::new(
                name,
                desc,
                BoundingBox::from_degrees(min_ra, min_dec, max_ra, max_dec),
                priority,
            )
        };

        #[rustfmt::skip]
        let regions = vec![
            // galactic core
            r("Galactic Centre", "Core of the Milky Way around Sagittarius A*", 265.0, 268.0, -30.0, -28.0, 100),
            // massive star formation
            r("Orion Complex", "Giant star-forming region (M42, M43, Horsehead)", 78.0, 88.0, -8.0, 2.0, 90),
            r("Cygnus X", "Massive star-forming region in Cygnus", 305.0, 312.0, 38.0, 44.0, 90),
            r("Carina Nebula", "Star-forming region around Eta Carinae", 158.0, 165.0, -62.0, -58.0, 90),
            r("Tarantula Nebula", "Giant HII region in the Large Magellanic Cloud", 82.0, 86.0, -70.0, -68.0, 90),
            // clusters
            r("Pleiades", "Young open cluster (M45)", 55.0, 58.0, 23.0, 25.0, 85),
            r("Hyades", "Nearby open cluster in Taurus", 64.0, 68.0, 14.0, 17.0, 85),
            r("Double Cluster", "Pair of open clusters in Perseus (NGC 869, NGC 884)", 33.0, 36.0, 56.0, 58.0, 85),
            // molecular clouds
            r("Taurus Molecular Cloud", "Large gas and dust cloud with ongoing star formation", 63.0, 70.0, 14.0, 30.0, 80),
            r("Ophiuchus Complex", "Dark clouds and star formation", 245.0, 250.0, -25.0, -20.0, 80),
            // nearby galaxies
            r("Andromeda Galaxy", "Nearest large spiral galaxy (M31)", 9.0, 12.0, 40.0, 42.0, 70),
            r("Triangulum Galaxy", "Local Group spiral galaxy (M33)", 23.0, 25.0, 29.0, 31.0, 70),
            r("Large Magellanic Cloud", "Dwarf satellite galaxy of the Milky Way", 75.0, 90.0, -72.0, -64.0, 70),
            r("Small Magellanic Cloud", "Dwarf satellite galaxy of the Milky Way", 10.0, 20.0, -74.0, -70.0, 70),
            // spiral arms
            r("Sagittarius Arm", "Inner spiral arm of the Milky Way", 260.0, 280.0, -35.0, -20.0, 50),
            r("Perseus Arm", "Outer spiral arm of the Milky Way", 30.0, 80.0, 30.0, 60.0, 50),
            r("Orion Arm", "Local spur that hosts the Solar System", 70.0, 90.0, -10.0, 10.0, 50),
            // broad bands
            r("Galactic Plane", "Band close to the Milky Way disc", 0.0, 360.0, -15.0, 15.0, 10),
            r("North Galactic Pole", "Direction perpendicular to the galactic disc", 0.0, 360.0, 60.0, 90.0, 10),
            r("South Galactic Pole", "Direction perpendicular to the galactic disc", 0.0, 360.0, -90.0, -60.0, 10),
            Region::catch_all(),
        ];
        Self::new(regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_galactic_centre_beats_sagittarius_arm() {
        let resolver = RegionResolver::milky_way();
        assert_eq!(resolver.find_region(266.41683, -29.00781).name, "Galactic Centre");
        assert_eq!(resolver.find_region(275.0, -30.0).name, "Sagittarius Arm");
    }

    #[test]
    fn test_specific_region_inside_broader_one() {
        let resolver = RegionResolver::milky_way();
        assert_eq!(resolver.find_region(83.8, -5.4).name, "Orion Complex");
        assert_eq!(resolver.find_region(72.0, 5.0).name, "Orion Arm");
        assert_eq!(resolver.find_region(84.0, -69.0).name, "Tarantula Nebula");
        assert_eq!(resolver.find_region(66.0, 15.5).name, "Hyades");
    }

    #[test]
    fn test_every_point_resolves() {
        let resolver = RegionResolver::milky_way();
        assert_eq!(resolver.find_region(200.0, 40.0).name, "Milky Way");
        assert_eq!(resolver.find_region(200.0, 0.0).name, "Galactic Plane");
        assert_eq!(resolver.find_region(f64::NAN, 0.0).name, "Milky Way");
        for ra in (0..360).step_by(15) {
            for dec in (-90..=90).step_by(15) {
                let _ = resolver.find_region(ra as f64, dec as f64);
            }
        }
    }

    #[test]
    fn test_ra_is_normalized_before_lookup() {
        let resolver = RegionResolver::milky_way();
        assert_eq!(resolver.find_region(266.5 + 360.0, -29.0).name, "Galactic Centre");
        assert_eq!(resolver.find_region(266.5 - 720.0, -29.0).name, "Galactic Centre");
    }

    #[test]
    fn test_wrapping_region_and_priority() {
        let resolver = RegionResolver::new(vec![
            Region::new("Wide", "", BoundingBox::from_degrees(300.0, -20.0, 60.0, 20.0), 1),
            Region::new("Seam", "", BoundingBox::from_degrees(350.0, -5.0, 10.0, 5.0), 5),
        ]);
        assert_eq!(resolver.find_region(355.0, 0.0).name, "Seam");
        assert_eq!(resolver.find_region(5.0, 0.0).name, "Seam");
        assert_eq!(resolver.find_region(30.0, 0.0).name, "Wide");
        assert_eq!(resolver.find_region(180.0, 0.0).name, "Milky Way");
        assert_eq!(resolver.regions().len(), 3);
    }

    #[test]
    fn test_equal_priority_prefers_earlier_entry() {
        let resolver = RegionResolver::new(vec![
            Region::new("First", "", BoundingBox::from_degrees(0.0, 0.0, 20.0, 20.0), 3),
            Region::new("Second", "", BoundingBox::from_degrees(10.0, 10.0, 30.0, 30.0), 3),
        ]);
        assert_eq!(resolver.find_region(15.0, 15.0).name, "First");
    }

    #[test]
    fn test_existing_catch_all_is_not_duplicated() {
        let resolver = RegionResolver::milky_way();
        let full_sky = resolver
            .regions()
            .iter()
            .filter(|r| r.name == "Milky Way")
            .count();
        assert_eq!(full_sky, 1);
    }

    #[test]
    fn test_context() {
        let region = Region::catch_all();
        assert_eq!(region.context(), "Milky Way - Our galaxy");
    }
}
