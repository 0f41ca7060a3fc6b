#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Builds country, region, and subregion aggregates from displacement events.
//!
//! Countries are built from the event store; regions and subregions are
//! merged from their member countries year by year and never re-scan the
//! raw events. Every place is checked by [`integrity::validate_place`]
//! before it is returned, so downstream consumers can rely on year and
//! vocabulary completeness.

pub mod integrity;

use std::collections::BTreeMap;

use choreo_aggregate_models::{
    CategoryTable, EventDetail, Geographies, HazardTable, Place, PlaceKind, YearAggregate,
};
use choreo_config::DomainConfig;
use choreo_event_models::{EventStore, year_span};
use choreo_geography_models::{Geography, GeographyTable};
use thiserror::Error;

pub use integrity::IntegrityError;

/// Errors that abort aggregate construction.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// A country has neither a lookup row nor an override.
    #[error("No geography for country '{country}' (ISO code '{iso_code}'); add a geography override")]
    MissingGeography {
        /// Country name.
        country: String,
        /// ISO code from the event data.
        iso_code: String,
    },

    /// A built place violates a completeness or consistency invariant.
    #[error("Data integrity error: {0}")]
    Integrity(#[from] IntegrityError),
}

/// Builds [`Place`] aggregates from an [`EventStore`].
#[derive(Debug, Clone)]
pub struct PlaceAggregator {
    geography: GeographyTable,
}

impl PlaceAggregator {
    /// Creates an aggregator that resolves countries through `geography`,
    /// with the overrides of `config` applied on top.
    #[must_use]
    pub fn new(config: &DomainConfig, geography: GeographyTable) -> Self {
        Self {
            geography: geography.with_overrides(config.geography_overrides()),
        }
    }

    /// Builds one [`Place`] per country, descending by total displaced.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::MissingGeography`] for a country that
    /// cannot be placed, or an integrity error if a built country is
    /// inconsistent.
    pub fn build_countries(&self, store: &EventStore) -> Result<Vec<Place>, AggregateError> {
        let names = store.countries();
        let mut countries = Vec::with_capacity(names.len());
        for name in names {
            let iso_code = store.iso_code_for(name).unwrap_or_default();
            let geography = self.geography.resolve(name, iso_code).ok_or_else(|| {
                AggregateError::MissingGeography {
                    country: name.to_owned(),
                    iso_code: iso_code.to_owned(),
                }
            })?;

            let place = build_country(store, name, geography);
            integrity::validate_place(&place)?;
            log::debug!(
                "Built country {} with {} displaced",
                place.name,
                place.total_displaced
            );
            countries.push(place);
        }

        sort_descending(&mut countries);
        log::info!(
            "Aggregated {} events into {} countries",
            store.len(),
            countries.len()
        );
        Ok(countries)
    }

    /// Builds regions and subregions from `countries`, each descending by
    /// total displaced.
    ///
    /// # Errors
    ///
    /// Returns an integrity error if a member is not a country or a merged
    /// place is inconsistent.
    pub fn build_geographies(&self, countries: &[Place]) -> Result<Geographies, AggregateError> {
        let regions = group_countries(countries, GroupLevel::Region)?;
        let sub_regions = group_countries(countries, GroupLevel::Subregion)?;
        log::info!(
            "Merged {} countries into {} regions and {} subregions",
            countries.len(),
            regions.len(),
            sub_regions.len()
        );
        Ok(Geographies {
            regions,
            sub_regions,
        })
    }
}

/// Buckets are keyed by each event's reporting year, not its start date.
fn build_country(store: &EventStore, name: &str, geography: Geography) -> Place {
    let years = year_span()
        .map(|year| {
            let details = store
                .for_country_year(name, year)
                .map(EventDetail::from)
                .collect();
            YearAggregate::from_details(year, details)
        })
        .collect();

    Place::from_years(name.to_owned(), PlaceKind::Country { geography }, years)
}

/// Levels that are merged from member countries.
#[derive(Debug, Clone, Copy)]
enum GroupLevel {
    Region,
    Subregion,
}

/// Groups `countries` by region or subregion, keeping first-seen group order
/// before the final sort.
fn group_countries(countries: &[Place], level: GroupLevel) -> Result<Vec<Place>, AggregateError> {
    let mut order: Vec<&str> = Vec::new();
    let mut members: BTreeMap<&str, Vec<Place>> = BTreeMap::new();

    for country in countries {
        let geography = country
            .geography()
            .ok_or_else(|| IntegrityError::NotACountry {
                place: country.name.clone(),
            })?;
        let group = match level {
            GroupLevel::Region => geography.region.as_str(),
            GroupLevel::Subregion => geography.sub_region.as_str(),
        };
        let entry = members.entry(group).or_default();
        if entry.is_empty() {
            order.push(group);
        }
        entry.push(country.clone());
    }

    let mut places = Vec::with_capacity(order.len());
    for name in order {
        let group = members.remove(name).unwrap_or_default();
        let years = merge_years(&group);
        let kind = match level {
            GroupLevel::Region => PlaceKind::Region { countries: group },
            GroupLevel::Subregion => PlaceKind::Subregion { countries: group },
        };
        let place = Place::from_years(name.to_owned(), kind, years);
        integrity::validate_place(&place)?;
        places.push(place);
    }

    sort_descending(&mut places);
    Ok(places)
}

/// Merges member years index-wise: dates are unioned and re-sorted, totals
/// add.
fn merge_years(members: &[Place]) -> Vec<YearAggregate> {
    year_span()
        .enumerate()
        .map(|(index, year)| {
            let member_years: Vec<&YearAggregate> =
                members.iter().filter_map(|m| m.years.get(index)).collect();

            let mut dates: Vec<EventDetail> = member_years
                .iter()
                .flat_map(|y| y.dates.iter().cloned())
                .collect();
            dates.sort_by_key(|d| d.date);

            YearAggregate {
                year,
                dates,
                total_displaced: member_years.iter().map(|y| y.total_displaced).sum(),
                hazards: HazardTable::sum(member_years.iter().map(|y| &y.hazards)),
                categories: CategoryTable::sum(member_years.iter().map(|y| &y.categories)),
            }
        })
        .collect()
}

/// Stable sort, most displaced first.
fn sort_descending(places: &mut [Place]) {
    places.sort_by(|a, b| b.total_displaced.cmp(&a.total_displaced));
}

#[cfg(test)]
mod tests {
    use super::*;
    use choreo_event_models::{RawEventRow, YEAR_COUNT};
    use choreo_geography_models::{Granularity, RegionRow};
    use choreo_hazard_models::HazardType;

    fn raw(country: &str, code: &str, start: &str, hazard: &str, displaced: u64) -> RawEventRow {
        RawEventRow {
            country: country.to_owned(),
            code: code.to_owned(),
            year: String::new(),
            start: start.to_owned(),
            crisis_category: "Weather related".to_owned(),
            hazard_type: hazard.to_owned(),
            displaced: displaced.to_string(),
            event: String::new(),
        }
    }

    fn region_row(alpha3: &str, region: &str, sub_region: &str) -> RegionRow {
        RegionRow {
            name: alpha3.to_owned(),
            alpha3: alpha3.to_owned(),
            region: region.to_owned(),
            sub_region: sub_region.to_owned(),
        }
    }

    fn aggregator() -> PlaceAggregator {
        let config = DomainConfig::embedded().unwrap();
        let table = GeographyTable::from_rows([
            region_row("ALP", "Asia", "Eastern Asia"),
            region_row("BET", "Asia", "Southern Asia"),
            region_row("GAM", "Europe", "Northern Europe"),
        ]);
        PlaceAggregator::new(&config, table)
    }

    fn alpha_beta_store() -> EventStore {
        EventStore::from_raw_rows(&[
            raw("Alpha", "ALP", "2008-03-01", "Flood", 100),
            raw("Alpha", "ALP", "2008-07-01", "Storm", 50),
            raw("Beta", "BET", "2009-05-01", "Flood", 10),
        ])
    }

    #[test]
    fn alpha_beta_scenario() {
        let countries = aggregator().build_countries(&alpha_beta_store()).unwrap();

        assert_eq!(countries.len(), 2);
        assert_eq!(countries[0].name, "Alpha");
        assert_eq!(countries[0].total_displaced, 150);
        assert_eq!(
            countries[0].years[0]
                .hazards
                .get(HazardType::Flood)
                .total_displaced,
            100
        );
        assert_eq!(countries[1].name, "Beta");
    }

    #[test]
    fn every_place_spans_all_years() {
        let aggregator = aggregator();
        let countries = aggregator.build_countries(&alpha_beta_store()).unwrap();
        let geos = aggregator.build_geographies(&countries).unwrap();

        for place in countries
            .iter()
            .chain(&geos.regions)
            .chain(&geos.sub_regions)
        {
            assert_eq!(place.years.len(), YEAR_COUNT, "{} year count", place.name);
            let years: Vec<i32> = place.years.iter().map(|y| y.year).collect();
            assert_eq!(years, year_span().collect::<Vec<_>>(), "{} years", place.name);
        }

        let beta = countries.iter().find(|c| c.name == "Beta").unwrap();
        assert!(beta.years[0].dates.is_empty());
        assert_eq!(beta.years[0].total_displaced, 0);
        assert!(beta.years[0].hazards.is_complete());
    }

    #[test]
    fn place_hazards_equal_sum_of_years() {
        let countries = aggregator().build_countries(&alpha_beta_store()).unwrap();
        for place in &countries {
            for hazard in place.hazards.iter() {
                let from_years: u64 = place
                    .years
                    .iter()
                    .map(|y| y.hazards.get(hazard.key).total_displaced)
                    .sum();
                assert_eq!(from_years, hazard.total_displaced, "{:?}", hazard.key);
            }
        }
    }

    #[test]
    fn regions_merge_members_by_year() {
        let aggregator = aggregator();
        let store = EventStore::from_raw_rows(&[
            raw("Alpha", "ALP", "2010-09-01", "Flood", 100),
            raw("Beta", "BET", "2010-02-01", "Flood", 30),
            raw("Beta", "BET", "2012-02-01", "Earthquake", 5),
            raw("Gamma", "GAM", "2010-01-01", "Storm", 1_000),
        ]);
        let countries = aggregator.build_countries(&store).unwrap();
        let geos = aggregator.build_geographies(&countries).unwrap();

        assert_eq!(geos.regions.len(), 2);
        assert_eq!(geos.regions[0].name, "Europe");
        assert_eq!(geos.sub_regions.len(), 3);
        assert!(geos.regions.iter().all(|r| r.granularity() == Granularity::Region));
        assert!(
            geos.sub_regions
                .iter()
                .all(|r| r.granularity() == Granularity::Subregion)
        );

        let asia = geos.regions.iter().find(|r| r.name == "Asia").unwrap();
        assert_eq!(asia.members().len(), 2);
        assert_eq!(asia.total_displaced, 135);

        let asia_2010 = &asia.years[2];
        assert_eq!(asia_2010.year, 2010);
        assert_eq!(asia_2010.hazards.get(HazardType::Flood).frequency, 2);
        assert_eq!(asia_2010.hazards.get(HazardType::Flood).total_displaced, 130);
        let dates: Vec<_> = asia_2010.dates.iter().map(|d| d.date).collect();
        assert!(dates.windows(2).all(|w| w[0] <= w[1]), "dates re-sorted");

        for (index, year) in asia.years.iter().enumerate() {
            for hazard in year.hazards.iter() {
                let member_sum: u64 = asia
                    .members()
                    .iter()
                    .map(|m| m.years[index].hazards.get(hazard.key).total_displaced)
                    .sum();
                assert_eq!(member_sum, hazard.total_displaced);
            }
        }
    }

    #[test]
    fn events_bucket_by_reporting_year() {
        let mut late = raw("Alpha", "ALP", "2007-12-30", "Storm", 70);
        late.year = "2008".to_owned();
        let store =
            EventStore::from_raw_rows(&[late, raw("Alpha", "ALP", "2009-01-02", "Flood", 5)]);
        let countries = aggregator().build_countries(&store).unwrap();

        let alpha = &countries[0];
        assert_eq!(alpha.years[0].year, 2008);
        assert_eq!(alpha.years[0].total_displaced, 70);
        assert_eq!(alpha.years[0].hazards.get(HazardType::Storm).frequency, 1);
        assert_eq!(alpha.years[1].total_displaced, 5);
        assert_eq!(alpha.total_displaced, 75);
    }

    #[test]
    fn unreadable_rows_do_not_block_aggregation() {
        let store = EventStore::from_raw_rows(&[
            raw("Alpha", "ALP", "2008-03-01", "Flood", 100),
            raw("Alpha", "ALP", "not a date", "Flood", 9),
            raw("Beta", "BET", "2021-01-01", "Flood", 9),
        ]);
        assert_eq!(store.skipped_rows(), 2);

        let countries = aggregator().build_countries(&store).unwrap();
        assert_eq!(countries.len(), 1);
        assert_eq!(countries[0].total_displaced, 100);
    }

    #[test]
    fn missing_geography_is_an_error() {
        let store = EventStore::from_raw_rows(&[raw("Atlantis", "ATL", "2010-01-01", "Flood", 1)]);
        assert!(matches!(
            aggregator().build_countries(&store),
            Err(AggregateError::MissingGeography { country, .. }) if country == "Atlantis"
        ));
    }

    #[test]
    fn overrides_place_countries_missing_from_lookup() {
        let store = EventStore::from_raw_rows(&[
            raw("Kosovo", "XKX", "2014-05-01", "Flood", 4),
            raw("Abyei Area", "", "2013-05-01", "Flood", 2),
        ]);
        let aggregator = aggregator();
        let countries = aggregator.build_countries(&store).unwrap();
        let kosovo = countries.iter().find(|c| c.name == "Kosovo").unwrap();
        assert_eq!(
            kosovo.geography().map(|g| g.sub_region.as_str()),
            Some("South-eastern Europe")
        );

        let geos = aggregator.build_geographies(&countries).unwrap();
        let names: Vec<_> = geos.regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Europe", "Africa"]);
    }

    #[test]
    fn geographies_reject_non_country_members() {
        let aggregator = aggregator();
        let countries = aggregator.build_countries(&alpha_beta_store()).unwrap();
        let geos = aggregator.build_geographies(&countries).unwrap();
        assert!(matches!(
            aggregator.build_geographies(&geos.regions),
            Err(AggregateError::Integrity(IntegrityError::NotACountry { .. }))
        ));
    }
}
