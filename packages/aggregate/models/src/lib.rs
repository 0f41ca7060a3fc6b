#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-place, per-year displacement aggregate types.
//!
//! Every place (country, region, or subregion) carries exactly one
//! [`YearAggregate`] per year of the supported span, and every aggregate
//! table carries one entry per key of its closed vocabulary. Both
//! completeness properties are structural: tables can only be built complete
//! and deserialization rejects incomplete ones.

use choreo_event_models::EventRecord;
use choreo_geography_models::{Geography, Granularity};
use choreo_hazard_models::{AggregateKey, CrisisCategory, HazardType};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Frequency and displacement totals for one key within a time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate<K> {
    /// Hazard type or crisis category.
    pub key: K,
    /// Number of events.
    pub frequency: u64,
    /// People displaced across those events.
    pub total_displaced: u64,
}

/// Totals for one hazard type.
pub type HazardAggregate = Aggregate<HazardType>;

/// Totals for one crisis category.
pub type CategoryAggregate = Aggregate<CrisisCategory>;

/// One [`Aggregate`] per key of `K`, stored in key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateTable<K> {
    entries: Vec<Aggregate<K>>,
}

/// Per-hazard totals.
pub type HazardTable = AggregateTable<HazardType>;

/// Per-category totals.
pub type CategoryTable = AggregateTable<CrisisCategory>;

impl<K: AggregateKey> Default for AggregateTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: AggregateKey> AggregateTable<K> {
    /// A table with a zero entry for every key.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: K::ALL
                .iter()
                .map(|&key| Aggregate {
                    key,
                    frequency: 0,
                    total_displaced: 0,
                })
                .collect(),
        }
    }

    /// Counts one event of `key` displacing `displaced` people.
    pub fn record(&mut self, key: K, displaced: u64) {
        let entry = &mut self.entries[key.ordinal()];
        entry.frequency += 1;
        entry.total_displaced += displaced;
    }

    /// Adds every entry of `other` into this table.
    pub fn absorb(&mut self, other: &Self) {
        for (mine, theirs) in self.entries.iter_mut().zip(&other.entries) {
            mine.frequency += theirs.frequency;
            mine.total_displaced += theirs.total_displaced;
        }
    }

    /// Sums a sequence of tables.
    #[must_use]
    pub fn sum<'a>(tables: impl IntoIterator<Item = &'a Self>) -> Self {
        let mut total = Self::new();
        for table in tables {
            total.absorb(table);
        }
        total
    }

    /// The entry for `key`.
    #[must_use]
    pub fn get(&self, key: K) -> &Aggregate<K> {
        &self.entries[key.ordinal()]
    }

    /// Entries in key order.
    pub fn iter(&self) -> std::slice::Iter<'_, Aggregate<K>> {
        self.entries.iter()
    }

    /// Whether the table holds exactly one entry per key, in key order.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.entries.len() == K::ALL.len()
            && self.entries.iter().zip(K::ALL).all(|(e, k)| e.key == *k)
    }

    /// Total events across all keys.
    #[must_use]
    pub fn total_frequency(&self) -> u64 {
        self.entries.iter().map(|e| e.frequency).sum()
    }

    /// Total displaced across all keys.
    #[must_use]
    pub fn total_displaced(&self) -> u64 {
        self.entries.iter().map(|e| e.total_displaced).sum()
    }

    /// Entries sorted descending by frequency; ties keep key order.
    #[must_use]
    pub fn by_frequency(&self) -> Vec<Aggregate<K>> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        sorted
    }
}

impl AggregateTable<HazardType> {
    /// Hazards rendered as stacked layers: known types with nonzero
    /// displacement, descending by displacement.
    #[must_use]
    pub fn stacked_keys(&self) -> Vec<HazardType> {
        let mut keys: Vec<&HazardAggregate> = self
            .entries
            .iter()
            .filter(|e| e.key.is_known() && e.total_displaced > 0)
            .collect();
        keys.sort_by(|a, b| b.total_displaced.cmp(&a.total_displaced));
        keys.into_iter().map(|e| e.key).collect()
    }
}

/// Error returned when deserializing a table that does not list every key
/// exactly once, in key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompleteTableError {
    /// Number of entries found.
    pub found: usize,
    /// Number of entries the vocabulary requires.
    pub expected: usize,
}

impl std::fmt::Display for IncompleteTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "aggregate table incomplete: {} entries for a vocabulary of {}",
            self.found, self.expected
        )
    }
}

impl std::error::Error for IncompleteTableError {}

impl<K: AggregateKey> TryFrom<Vec<Aggregate<K>>> for AggregateTable<K> {
    type Error = IncompleteTableError;

    fn try_from(entries: Vec<Aggregate<K>>) -> Result<Self, Self::Error> {
        let table = Self { entries };
        if table.is_complete() {
            Ok(table)
        } else {
            Err(IncompleteTableError {
                found: table.entries.len(),
                expected: K::ALL.len(),
            })
        }
    }
}

impl<K: Serialize> Serialize for AggregateTable<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de, K: AggregateKey + Deserialize<'de>> Deserialize<'de> for AggregateTable<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<Aggregate<K>>::deserialize(deserializer)?;
        Self::try_from(entries).map_err(serde::de::Error::custom)
    }
}

/// One event as it appears inside a [`YearAggregate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    /// Event start date.
    pub date: NaiveDate,
    /// People displaced.
    pub displaced: u64,
    /// Crisis category.
    pub crisis_category: CrisisCategory,
    /// Hazard type.
    pub hazard_type: HazardType,
    /// Event name.
    pub event_label: String,
}

impl From<&EventRecord> for EventDetail {
    fn from(event: &EventRecord) -> Self {
        Self {
            date: event.occurred_on,
            displaced: event.people_displaced,
            crisis_category: event.crisis_category,
            hazard_type: event.hazard_type,
            event_label: event.event_label.clone(),
        }
    }
}

/// Everything that happened to one place in one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearAggregate {
    /// Calendar year.
    pub year: i32,
    /// Events, ascending by date.
    pub dates: Vec<EventDetail>,
    /// People displaced across all events of the year.
    pub total_displaced: u64,
    /// Per-hazard totals.
    pub hazards: HazardTable,
    /// Per-category totals.
    pub categories: CategoryTable,
}

impl YearAggregate {
    /// Builds a year from its events. Details are sorted by date (stable)
    /// and every total is computed from that same list.
    #[must_use]
    pub fn from_details(year: i32, mut dates: Vec<EventDetail>) -> Self {
        dates.sort_by_key(|d| d.date);

        let mut hazards = HazardTable::new();
        let mut categories = CategoryTable::new();
        for detail in &dates {
            hazards.record(detail.hazard_type, detail.displaced);
            categories.record(detail.crisis_category, detail.displaced);
        }

        Self {
            year,
            total_displaced: dates.iter().map(|d| d.displaced).sum(),
            dates,
            hazards,
            categories,
        }
    }
}

/// What kind of place a [`Place`] is, with the data specific to that kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "granularity", rename_all = "lowercase")]
pub enum PlaceKind {
    /// A single country and where it sits geographically.
    Country {
        /// ISO code, region, and subregion.
        geography: Geography,
    },
    /// A region and the countries it aggregates.
    Region {
        /// Member countries, descending by displacement.
        countries: Vec<Place>,
    },
    /// A subregion and the countries it aggregates.
    Subregion {
        /// Member countries, descending by displacement.
        countries: Vec<Place>,
    },
}

/// A geographic aggregation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// Country, region, or subregion name.
    pub name: String,
    /// Kind-specific data.
    pub kind: PlaceKind,
    /// People displaced across every year.
    pub total_displaced: u64,
    /// One aggregate per year, ascending.
    pub years: Vec<YearAggregate>,
    /// Per-hazard totals across every year.
    pub hazards: HazardTable,
    /// Per-category totals across every year.
    pub categories: CategoryTable,
}

impl Place {
    /// Builds a place whose all-year totals are the sums of `years`.
    #[must_use]
    pub fn from_years(name: String, kind: PlaceKind, years: Vec<YearAggregate>) -> Self {
        let hazards = HazardTable::sum(years.iter().map(|y| &y.hazards));
        let categories = CategoryTable::sum(years.iter().map(|y| &y.categories));
        Self {
            name,
            kind,
            total_displaced: years.iter().map(|y| y.total_displaced).sum(),
            years,
            hazards,
            categories,
        }
    }

    /// The geographic level of this place.
    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        match self.kind {
            PlaceKind::Country { .. } => Granularity::Country,
            PlaceKind::Region { .. } => Granularity::Region,
            PlaceKind::Subregion { .. } => Granularity::Subregion,
        }
    }

    /// Member countries; empty for a country.
    #[must_use]
    pub fn members(&self) -> &[Self] {
        match &self.kind {
            PlaceKind::Country { .. } => &[],
            PlaceKind::Region { countries } | PlaceKind::Subregion { countries } => {
                countries.as_slice()
            }
        }
    }

    /// Geography of a country; `None` for regions and subregions.
    #[must_use]
    pub const fn geography(&self) -> Option<&Geography> {
        match &self.kind {
            PlaceKind::Country { geography } => Some(geography),
            PlaceKind::Region { .. } | PlaceKind::Subregion { .. } => None,
        }
    }
}

/// Regions and subregions built from the same set of countries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geographies {
    /// Regions, descending by displacement.
    pub regions: Vec<Place>,
    /// Subregions, descending by displacement.
    pub sub_regions: Vec<Place>,
}

/// The top places of one granularity and their combined totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingResult {
    /// Level the places were ranked at.
    pub granularity: Granularity,
    /// Selected places, descending by displacement.
    pub top_places: Vec<Place>,
    /// Per-hazard totals over the selected places only.
    pub top_hazards: HazardTable,
    /// Per-category totals over the selected places only.
    pub top_categories: CategoryTable,
}
