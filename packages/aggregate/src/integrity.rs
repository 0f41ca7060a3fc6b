//! Consistency checks run on every built place.

use choreo_aggregate_models::{Place, PlaceKind};
use choreo_event_models::{YEAR_COUNT, year_span};
use thiserror::Error;

/// A built place that violates a completeness or consistency invariant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntegrityError {
    /// The place does not carry exactly one aggregate per supported year.
    #[error("Place '{place}' covers {years} years instead of {expected}", expected = YEAR_COUNT)]
    YearSpan {
        /// Place name.
        place: String,
        /// Number of years found.
        years: usize,
    },

    /// An aggregate table is missing a vocabulary entry.
    #[error("Place '{place}' has an incomplete aggregate table (year {year:?})")]
    IncompleteVocabulary {
        /// Place name.
        place: String,
        /// Year of the table, `None` for the all-year table.
        year: Option<i32>,
    },

    /// A year's totals disagree with its event list.
    #[error("Place '{place}' year {year} totals disagree with its events")]
    YearTotals {
        /// Place name.
        place: String,
        /// Calendar year.
        year: i32,
    },

    /// All-year totals disagree with the sum of the years.
    #[error("Place '{place}' totals disagree with the sum of its years")]
    PlaceTotals {
        /// Place name.
        place: String,
    },

    /// A merged year disagrees with the sum of its members.
    #[error("Place '{place}' year {year} disagrees with the sum of its member countries")]
    MemberTotals {
        /// Place name.
        place: String,
        /// Calendar year.
        year: i32,
    },

    /// A country was expected but the place aggregates others.
    #[error("Place '{place}' is not a country")]
    NotACountry {
        /// Place name.
        place: String,
    },
}

/// Checks that `place` spans every year, that every table is complete, and
/// that every total agrees with the data beneath it.
///
/// # Errors
///
/// Returns the first violated invariant.
pub fn validate_place(place: &Place) -> Result<(), IntegrityError> {
    let name = || place.name.clone();

    if place.years.len() != YEAR_COUNT
        || !place.years.iter().map(|y| y.year).eq(year_span())
    {
        return Err(IntegrityError::YearSpan {
            place: name(),
            years: place.years.len(),
        });
    }

    if !place.hazards.is_complete() || !place.categories.is_complete() {
        return Err(IntegrityError::IncompleteVocabulary {
            place: name(),
            year: None,
        });
    }

    for year in &place.years {
        if !year.hazards.is_complete() || !year.categories.is_complete() {
            return Err(IntegrityError::IncompleteVocabulary {
                place: name(),
                year: Some(year.year),
            });
        }

        let from_dates: u64 = year.dates.iter().map(|d| d.displaced).sum();
        let count = year.dates.len() as u64;
        if from_dates != year.total_displaced
            || year.hazards.total_displaced() != from_dates
            || year.categories.total_displaced() != from_dates
            || year.hazards.total_frequency() != count
            || year.categories.total_frequency() != count
        {
            return Err(IntegrityError::YearTotals {
                place: name(),
                year: year.year,
            });
        }
    }

    let year_sum: u64 = place.years.iter().map(|y| y.total_displaced).sum();
    if year_sum != place.total_displaced
        || place.hazards.total_displaced() != year_sum
        || place.categories.total_displaced() != year_sum
    {
        return Err(IntegrityError::PlaceTotals { place: name() });
    }

    if let PlaceKind::Region { countries } | PlaceKind::Subregion { countries } = &place.kind {
        for (index, year) in place.years.iter().enumerate() {
            let members = countries.iter().filter_map(|c| c.years.get(index));
            let mut displaced = 0;
            let mut frequency = 0;
            for member in members {
                displaced += member.total_displaced;
                frequency += member.hazards.total_frequency();
            }
            if displaced != year.total_displaced || frequency != year.hazards.total_frequency() {
                return Err(IntegrityError::MemberTotals {
                    place: name(),
                    year: year.year,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use choreo_aggregate_models::{EventDetail, YearAggregate};
    use choreo_geography_models::Geography;
    use choreo_hazard_models::{CrisisCategory, HazardType};
    use chrono::NaiveDate;

    fn country(name: &str, displaced: u64) -> Place {
        let years = year_span()
            .map(|year| {
                let details = if year == 2015 {
                    vec![EventDetail {
                        date: chrono_date(2015),
                        displaced,
                        crisis_category: CrisisCategory::Geophysical,
                        hazard_type: HazardType::Earthquake,
                        event_label: "quake".to_owned(),
                    }]
                } else {
                    Vec::new()
                };
                YearAggregate::from_details(year, details)
            })
            .collect();
        Place::from_years(
            name.to_owned(),
            PlaceKind::Country {
                geography: Geography {
                    iso_code: "ALP".to_owned(),
                    region: "Asia".to_owned(),
                    sub_region: "Eastern Asia".to_owned(),
                },
            },
            years,
        )
    }

    fn chrono_date(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 4, 25).unwrap()
    }

    #[test]
    fn built_country_is_valid() {
        assert_eq!(validate_place(&country("Alpha", 8_000)), Ok(()));
    }

    #[test]
    fn missing_year_is_rejected() {
        let mut place = country("Alpha", 10);
        place.years.pop();
        assert!(matches!(
            validate_place(&place),
            Err(IntegrityError::YearSpan { years: 12, .. })
        ));
    }

    #[test]
    fn tampered_year_total_is_rejected() {
        let mut place = country("Alpha", 10);
        place.years[7].total_displaced += 1;
        assert_eq!(
            validate_place(&place),
            Err(IntegrityError::YearTotals {
                place: "Alpha".to_owned(),
                year: 2015,
            })
        );
    }

    #[test]
    fn tampered_place_total_is_rejected() {
        let mut place = country("Alpha", 10);
        place.total_displaced = 0;
        assert!(matches!(
            validate_place(&place),
            Err(IntegrityError::PlaceTotals { .. })
        ));
    }

    #[test]
    fn region_must_match_members() {
        let members = vec![country("Alpha", 10), country("Beta", 5)];
        let mut years = members[0].years.clone();
        years[7] = members[1].years[7].clone();
        let region = Place::from_years(
            "Asia".to_owned(),
            PlaceKind::Region { countries: members },
            years,
        );
        assert!(matches!(
            validate_place(&region),
            Err(IntegrityError::MemberTotals { year: 2015, .. })
        ));
    }
}
