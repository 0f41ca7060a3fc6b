//! Stacked-layer data for the render surface.

use choreo_aggregate_models::{Place, YearAggregate};
use choreo_event_models::FIRST_YEAR;
use choreo_hazard_models::HazardType;
use choreo_navigation_models::{LayerPeriod, LayerRow, StackLayers};

/// `stacked` restricted to `visible`, keeping the stacked order.
fn visible_keys(stacked: Vec<HazardType>, visible: &[HazardType]) -> Vec<HazardType> {
    stacked.into_iter().filter(|k| visible.contains(k)).collect()
}

/// One row per year from the first year through `last_year`, with the
/// place-wide stacked keys that are visible.
#[must_use]
pub fn span_layers(place: &Place, last_year: i32, visible: &[HazardType]) -> StackLayers {
    let keys = visible_keys(place.hazards.stacked_keys(), visible);
    let rows = place
        .years
        .iter()
        .filter(|y| (FIRST_YEAR..=last_year).contains(&y.year))
        .map(|y| LayerRow {
            period: LayerPeriod::Year(y.year),
            values: keys
                .iter()
                .map(|&k| y.hazards.get(k).total_displaced)
                .collect(),
        })
        .collect();

    StackLayers { keys, rows }
}

/// One row per event of `year` whose hazard is a visible stacked key of
/// that year. Keys other than the event's own hazard read 0.
#[must_use]
pub fn date_layers(year: &YearAggregate, visible: &[HazardType]) -> StackLayers {
    let keys = visible_keys(year.hazards.stacked_keys(), visible);
    let rows = year
        .dates
        .iter()
        .filter(|d| keys.contains(&d.hazard_type))
        .map(|d| LayerRow {
            period: LayerPeriod::Date(d.date),
            values: keys
                .iter()
                .map(|&k| if k == d.hazard_type { d.displaced } else { 0 })
                .collect(),
        })
        .collect();

    StackLayers { keys, rows }
}
