//! Named map regions and safe zones.
//!
//! Regions are axis-aligned boxes on the ground plane (x, z); height is
//! ignored. The table is checked in order and the first match wins.

use crate::math::{Fixed, Vec3Fixed};

/// Name reported below ground level when no region matches.
pub const UNDERGROUND: &str = "underground";

/// Name reported at or above ground level when no region matches.
pub const WILDERNESS: &str = "wilderness";

/// A named rectangle of the map. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Region name.
    pub name: &'static str,
    /// Whether combat is disallowed here.
    pub safe: bool,
    /// Western edge.
    pub min_x: i32,
    /// Eastern edge.
    pub max_x: i32,
    /// Southern edge.
    pub min_z: i32,
    /// Northern edge.
    pub max_z: i32,
}

impl Region {
    const fn new(name: &'static str, safe: bool, x: (i32, i32), z: (i32, i32)) -> Self {
        Self {
            name,
            safe,
            min_x: x.0,
            max_x: x.1,
            min_z: z.0,
            max_z: z.1,
        }
    }

    /// Whether `position` lies inside this region.
    #[must_use]
    pub fn contains(&self, position: Vec3Fixed) -> bool {
        let within = |v: Fixed, min: i32, max: i32| {
            v >= Fixed::from_num(min) && v <= Fixed::from_num(max)
        };
        within(position.x, self.min_x, self.max_x) && within(position.z, self.min_z, self.max_z)
    }
}

/// The fixed region table, in priority order.
pub const REGIONS: &[Region] = &[
    Region::new("lumbridge", true, (3200, 3260), (3200, 3260)),
    Region::new("varrock", true, (3180, 3260), (3380, 3460)),
    Region::new("falador", true, (2940, 3060), (3310, 3390)),
    Region::new("draynor", false, (3080, 3130), (3230, 3280)),
    Region::new("barbarian_village", false, (3070, 3100), (3400, 3440)),
];

/// First region containing `position`.
#[must_use]
pub fn find_region(position: Vec3Fixed) -> Option<&'static Region> {
    REGIONS.iter().find(|region| region.contains(position))
}

/// Name of the region at `position`, falling back to underground or wilderness.
#[must_use]
pub fn region_at(position: Vec3Fixed) -> &'static str {
    match find_region(position) {
        Some(region) => region.name,
        None if position.y < Fixed::ZERO => UNDERGROUND,
        None => WILDERNESS,
    }
}

/// Whether combat is disallowed at `position`.
#[must_use]
pub fn is_in_safe_zone(position: Vec3Fixed) -> bool {
    find_region(position).is_some_and(|region| region.safe)
}
