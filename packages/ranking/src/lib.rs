#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Top-N selection over aggregated places.

use choreo_aggregate_models::{CategoryTable, HazardTable, Place, RankingResult};
use choreo_geography_models::Granularity;
use thiserror::Error;

/// Errors from [`select_top`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RankingError {
    /// A place of another granularity was passed in.
    #[error("Cannot rank {found} '{place}' among {expected} places")]
    GranularityMismatch {
        /// Requested granularity.
        expected: Granularity,
        /// Granularity of the offending place.
        found: Granularity,
        /// Offending place.
        place: String,
    },
}

/// Selects the first `max` places, which must already be sorted descending
/// by total displaced, and sums their hazard and category totals.
///
/// `max` is clamped to the number of places. The input order is kept.
///
/// # Errors
///
/// Returns [`RankingError::GranularityMismatch`] if any place is not of
/// `granularity`.
pub fn select_top(
    places: &[Place],
    granularity: Granularity,
    max: usize,
) -> Result<RankingResult, RankingError> {
    if let Some(place) = places.iter().find(|p| p.granularity() != granularity) {
        return Err(RankingError::GranularityMismatch {
            expected: granularity,
            found: place.granularity(),
            place: place.name.clone(),
        });
    }

    let count = max.min(places.len());
    let top_places = places[..count].to_vec();

    let top_hazards = HazardTable::sum(top_places.iter().map(|p| &p.hazards));
    let top_categories = CategoryTable::sum(top_places.iter().map(|p| &p.categories));

    log::info!(
        "Selected {count} of {} {granularity} places ({} displaced)",
        places.len(),
        top_hazards.total_displaced()
    );

    Ok(RankingResult {
        granularity,
        top_places,
        top_hazards,
        top_categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use choreo_aggregate_models::{PlaceKind, YearAggregate};
    use choreo_hazard_models::HazardType;

    fn region(name: &str, flood: u64) -> Place {
        let mut years: Vec<YearAggregate> = (2008..=2020)
            .map(|year| YearAggregate::from_details(year, Vec::new()))
            .collect();
        years[0].hazards.record(HazardType::Flood, flood);
        years[0].total_displaced = flood;
        Place::from_years(
            name.to_owned(),
            PlaceKind::Region {
                countries: Vec::new(),
            },
            years,
        )
    }

    #[test]
    fn keeps_input_order_and_sums_selection_only() {
        let places = vec![region("Asia", 300), region("Europe", 200), region("Africa", 100)];
        let result = select_top(&places, Granularity::Region, 2).unwrap();

        let names: Vec<_> = result.top_places.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Asia", "Europe"]);
        assert_eq!(result.top_hazards.get(HazardType::Flood).total_displaced, 500);
        assert_eq!(result.top_hazards.get(HazardType::Flood).frequency, 2);
        assert!(result.top_categories.is_complete());
    }

    #[test]
    fn max_is_clamped() {
        let places = vec![region("Asia", 3), region("Europe", 2)];
        let result = select_top(&places, Granularity::Region, 10).unwrap();
        assert_eq!(result.top_places.len(), 2);

        let none = select_top(&places, Granularity::Region, 0).unwrap();
        assert!(none.top_places.is_empty());
        assert_eq!(none.top_hazards.total_displaced(), 0);
    }

    #[test]
    fn does_not_re_sort() {
        let places = vec![region("Small", 1), region("Large", 1_000)];
        let result = select_top(&places, Granularity::Region, 1).unwrap();
        assert_eq!(result.top_places[0].name, "Small");
    }

    #[test]
    fn rejects_mixed_granularity() {
        let places = vec![region("Asia", 3)];
        assert_eq!(
            select_top(&places, Granularity::Country, 1),
            Err(RankingError::GranularityMismatch {
                expected: Granularity::Country,
                found: Granularity::Region,
                place: "Asia".to_owned(),
            })
        );
    }
}
