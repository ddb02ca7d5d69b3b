//! Regions & Warehouses
//!
//! A region is the unit of warehouse routing and fee calculation. Every serviceable region has
//! exactly one warehouse with a flat delivery fee.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Amount;

/// Errors raised by warehouse directory lookups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionError {
    /// No warehouse is seeded for the region.
    #[error("no warehouse seeded for region {0}")]
    NotFound(Region),

    /// The seed document could not be parsed.
    #[error("invalid region seed document: {0}")]
    InvalidSeed(String),

    /// The seed document lists a region more than once.
    #[error("region {0} listed more than once")]
    Duplicate(Region),
}

/// Administrative delivery zone, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Region(String);

impl Region {
    /// Create a region from a display name; surrounding whitespace is ignored.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_lowercase())
    }

    /// Normalised region name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Region {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Region {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<Region> for String {
    fn from(value: Region) -> Self {
        value.0
    }
}

/// Regional warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub region: Region,
    pub address: String,
    pub flat_fee: Amount,
}

/// Static per-region warehouse lookup.
#[derive(Debug, Clone, Default)]
pub struct WarehouseDirectory {
    warehouses: FxHashMap<Region, Warehouse>,
}

impl WarehouseDirectory {
    /// Build a directory from warehouses, rejecting duplicate regions.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::Duplicate`] when a region appears twice.
    pub fn new(warehouses: impl IntoIterator<Item = Warehouse>) -> Result<Self, RegionError> {
        let mut directory = FxHashMap::default();

        for warehouse in warehouses {
            let region = warehouse.region.clone();

            if directory.insert(region.clone(), warehouse).is_some() {
                return Err(RegionError::Duplicate(region));
            }
        }

        Ok(Self {
            warehouses: directory,
        })
    }

    /// Look up the warehouse serving `region`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::NotFound`] when the region has no warehouse.
    pub fn lookup(&self, region: &Region) -> Result<&Warehouse, RegionError> {
        self.warehouses
            .get(region)
            .ok_or_else(|| RegionError::NotFound(region.clone()))
    }

    /// Number of seeded regions.
    pub fn len(&self) -> usize {
        self.warehouses.len()
    }

    /// Whether no region is seeded.
    pub fn is_empty(&self) -> bool {
        self.warehouses.is_empty()
    }

    /// Warehouses ordered by region name.
    pub fn warehouses(&self) -> Vec<&Warehouse> {
        let mut warehouses: Vec<&Warehouse> = self.warehouses.values().collect();

        warehouses.sort_by(|a, b| a.region.cmp(&b.region));

        warehouses
    }
}

/// Region seed entry as written in the seed document.
#[derive(Debug, Clone, Deserialize)]
struct RegionSeed {
    region: String,
    #[serde(default)]
    address: Option<String>,
    flat_fee: Amount,
}

/// Region seed document.
#[derive(Debug, Clone, Deserialize)]
struct RegionSeedDocument {
    regions: Vec<RegionSeed>,
}

/// Parse a YAML seed document into warehouses.
///
/// Regions without an address get a placeholder address naming the region.
///
/// # Errors
///
/// Returns [`RegionError::InvalidSeed`] when the YAML cannot be parsed and
/// [`RegionError::Duplicate`] when a region is listed twice.
pub fn parse_seed(yaml: &str) -> Result<Vec<Warehouse>, RegionError> {
    let document: RegionSeedDocument =
        serde_norway::from_str(yaml).map_err(|error| RegionError::InvalidSeed(error.to_string()))?;

    let warehouses: Vec<Warehouse> = document
        .regions
        .into_iter()
        .map(|seed| {
            let region = Region::new(&seed.region);
            let address = seed
                .address
                .unwrap_or_else(|| format!("{} regional warehouse", seed.region.trim()));

            Warehouse {
                region,
                address,
                flat_fee: seed.flat_fee,
            }
        })
        .collect();

    WarehouseDirectory::new(warehouses.iter().cloned())?;

    Ok(warehouses)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::fixtures::warehouse;

    use super::*;

    #[test]
    fn region_names_are_case_insensitive() {
        assert_eq!(Region::new(" Cairo "), Region::new("cairo"));
        assert_eq!(Region::new("GIZA").as_str(), "giza");
    }

    #[test]
    fn lookup_returns_seeded_warehouse() -> TestResult {
        let directory = WarehouseDirectory::new([warehouse("Cairo", 3_000)])?;

        let found = directory.lookup(&Region::new("cairo"))?;

        assert_eq!(found.flat_fee, 3_000);

        Ok(())
    }

    #[test]
    fn lookup_unknown_region_is_not_found() -> TestResult {
        let directory = WarehouseDirectory::new([warehouse("Cairo", 3_000)])?;

        let result = directory.lookup(&Region::new("Aswan"));

        assert_eq!(result, Err(RegionError::NotFound(Region::new("aswan"))));

        Ok(())
    }

    #[test]
    fn duplicate_regions_are_rejected() {
        let result = WarehouseDirectory::new([warehouse("Cairo", 1), warehouse("CAIRO", 2)]);

        assert!(
            matches!(result, Err(RegionError::Duplicate(_))),
            "expected Duplicate, got {result:?}"
        );
    }

    #[test]
    fn parse_seed_fills_placeholder_addresses() -> TestResult {
        let yaml = "regions:\n  - region: Cairo\n    flat_fee: 3000\n  - region: Giza\n    address: 12 Pyramids Rd\n    flat_fee: 2500\n";

        let warehouses = parse_seed(yaml)?;

        assert_eq!(warehouses.len(), 2);
        assert_eq!(
            warehouses.first().map(|w| w.address.as_str()),
            Some("Cairo regional warehouse")
        );
        assert_eq!(
            warehouses.get(1).map(|w| w.address.as_str()),
            Some("12 Pyramids Rd")
        );

        Ok(())
    }

    #[test]
    fn parse_seed_rejects_malformed_documents() {
        let result = parse_seed("regions: nope");

        assert!(
            matches!(result, Err(RegionError::InvalidSeed(_))),
            "expected InvalidSeed, got {result:?}"
        );
    }
}
