#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Country to region/subregion lookup types.
//!
//! The lookup table is keyed by ISO 3166 alpha-3 code, as supplied by the
//! `regions.csv` collaborator file. Countries missing from that file are
//! resolved through an explicit override list keyed by country name, so no
//! country is ever dropped for lack of geography data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Geographic level a place is aggregated at.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Granularity {
    /// A single country.
    Country,
    /// A continental region (e.g. "Asia").
    Region,
    /// A subregion (e.g. "South-eastern Asia").
    Subregion,
}

/// One row of the `regions.csv` collaborator file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRow {
    /// Country name as spelled in the lookup file.
    pub name: String,
    /// ISO 3166 alpha-3 code.
    pub alpha3: String,
    /// Region name; may be blank for territories.
    #[serde(default)]
    pub region: String,
    /// Subregion name; may be blank for territories.
    #[serde(default, rename = "subRegion")]
    pub sub_region: String,
}

/// A manual geography assignment for a country the lookup file lacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeographyOverride {
    /// Country name as spelled in the event data.
    pub country: String,
    /// Region to assign.
    pub region: String,
    /// Subregion to assign.
    pub sub_region: String,
}

/// The region and subregion a country belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geography {
    /// ISO 3166 alpha-3 code from the event data.
    pub iso_code: String,
    /// Region name.
    pub region: String,
    /// Subregion name.
    pub sub_region: String,
}

/// Lookup from ISO code (or overridden country name) to [`Geography`].
#[derive(Debug, Clone, Default)]
pub struct GeographyTable {
    by_alpha3: BTreeMap<String, RegionRow>,
    overrides: BTreeMap<String, GeographyOverride>,
}

impl GeographyTable {
    /// Builds a table from the rows of the lookup file. Later rows with a
    /// duplicate alpha-3 code are ignored.
    #[must_use]
    pub fn from_rows(rows: impl IntoIterator<Item = RegionRow>) -> Self {
        let mut by_alpha3 = BTreeMap::new();
        for row in rows {
            by_alpha3.entry(row.alpha3.clone()).or_insert(row);
        }
        Self {
            by_alpha3,
            overrides: BTreeMap::new(),
        }
    }

    /// Adds manual overrides. An override takes precedence over the lookup
    /// file for its country.
    #[must_use]
    pub fn with_overrides<'a>(
        mut self,
        overrides: impl IntoIterator<Item = &'a GeographyOverride>,
    ) -> Self {
        for entry in overrides {
            self.overrides.insert(entry.country.clone(), entry.clone());
        }
        self
    }

    /// Number of rows loaded from the lookup file.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_alpha3.len()
    }

    /// Whether the lookup file contributed no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_alpha3.is_empty()
    }

    /// Resolves the geography of `country`, whose event data carries
    /// `iso_code`.
    ///
    /// Returns `None` when neither an override nor a lookup row with a
    /// non-blank region exists.
    #[must_use]
    pub fn resolve(&self, country: &str, iso_code: &str) -> Option<Geography> {
        if let Some(entry) = self.overrides.get(country) {
            return Some(Geography {
                iso_code: iso_code.to_owned(),
                region: entry.region.clone(),
                sub_region: entry.sub_region.clone(),
            });
        }

        self.by_alpha3
            .get(iso_code)
            .filter(|row| !row.region.is_empty())
            .map(|row| Geography {
                iso_code: iso_code.to_owned(),
                region: row.region.clone(),
                sub_region: row.sub_region.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, alpha3: &str, region: &str, sub_region: &str) -> RegionRow {
        RegionRow {
            name: name.to_owned(),
            alpha3: alpha3.to_owned(),
            region: region.to_owned(),
            sub_region: sub_region.to_owned(),
        }
    }

    #[test]
    fn resolves_by_alpha3() {
        let table = GeographyTable::from_rows([row("China", "CHN", "Asia", "Eastern Asia")]);
        let geo = table.resolve("China", "CHN").unwrap();
        assert_eq!(geo.region, "Asia");
        assert_eq!(geo.sub_region, "Eastern Asia");
        assert_eq!(geo.iso_code, "CHN");
    }

    #[test]
    fn override_wins_and_fills_gaps() {
        let overrides = [GeographyOverride {
            country: "Kosovo".to_owned(),
            region: "Europe".to_owned(),
            sub_region: "South-eastern Europe".to_owned(),
        }];
        let table = GeographyTable::from_rows([row("Serbia", "SRB", "Europe", "Southern Europe")])
            .with_overrides(&overrides);

        let geo = table.resolve("Kosovo", "XKX").unwrap();
        assert_eq!(geo.sub_region, "South-eastern Europe");
        assert!(table.resolve("Atlantis", "ATL").is_none());
    }

    #[test]
    fn blank_region_rows_do_not_resolve() {
        let table = GeographyTable::from_rows([row("Antarctica", "ATA", "", "")]);
        assert!(table.resolve("Antarctica", "ATA").is_none());
    }

    #[test]
    fn granularity_round_trips_through_strings() {
        assert_eq!("subregion".parse::<Granularity>().unwrap(), Granularity::Subregion);
        assert_eq!(Granularity::Region.to_string(), "region");
    }
}
