//! Region shipping rate table
//!
//! Delivery fees per district, in LKR. The first entry is the default used
//! for any city that does not match a district name.

use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Region {
    pub name: &'static str,
    pub distance_km: u32,
    pub rate: Decimal,
}

const fn region(name: &'static str, distance_km: u32, rate: u32) -> Region {
    Region { name, distance_km, rate: Decimal::from_parts(rate, 0, 0, false, 0) }
}

pub static REGIONS: [Region; 25] = [
    region("Colombo", 0, 200),
    region("Gampaha", 27, 250),
    region("Kalutara", 43, 250),
    region("Kandy", 115, 350),
    region("Matale", 142, 400),
    region("Nuwara Eliya", 161, 450),
    region("Galle", 119, 350),
    region("Matara", 160, 400),
    region("Hambantota", 238, 500),
    region("Jaffna", 396, 650),
    region("Kilinochchi", 331, 600),
    region("Mannar", 290, 600),
    region("Vavuniya", 254, 550),
    region("Mullaitivu", 318, 600),
    region("Batticaloa", 314, 600),
    region("Ampara", 360, 600),
    region("Trincomalee", 257, 550),
    region("Kurunegala", 94, 300),
    region("Puttalam", 131, 350),
    region("Anuradhapura", 205, 450),
    region("Polonnaruwa", 216, 500),
    region("Badulla", 230, 500),
    region("Monaragala", 250, 550),
    region("Ratnapura", 101, 300),
    region("Kegalle", 78, 300),
];

/// Rate table lookups. Wraps a slice so tests and deployments can supply
/// their own table.
#[derive(Clone, Copy, Debug)]
pub struct RegionTable {
    regions: &'static [Region],
}

impl Default for RegionTable {
    fn default() -> Self { Self { regions: &REGIONS } }
}

impl RegionTable {
    /// `regions` must be non-empty; its first entry is the fallback.
    pub fn new(regions: &'static [Region]) -> Option<Self> {
        if regions.is_empty() { return None; }
        Some(Self { regions })
    }

    pub fn default_region(&self) -> &'static Region { &self.regions[0] }

    /// Case-insensitive exact match on the trimmed city name.
    pub fn lookup(&self, city: &str) -> Option<&'static Region> {
        let city = city.trim();
        self.regions.iter().find(|r| r.name.eq_ignore_ascii_case(city))
    }

    pub fn rate_for(&self, city: &str) -> Decimal {
        match self.lookup(city) {
            Some(region) => region.rate,
            None => {
                let fallback = self.default_region();
                tracing::debug!(city, fallback = fallback.name, "no region match, using default rate");
                fallback.rate
            }
        }
    }
}
