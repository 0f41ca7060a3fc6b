#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Derives the logarithmic movement score of a place.
//!
//! Each year of a place becomes a [`ScoreEntry`]: the hazards that displaced
//! anyone that year, most displacing first, each annotated with a number of
//! steps (from displacement) and repetitions (from frequency). Both levels
//! come from [`LogScale`]s fitted once per place.

pub mod scale;

use std::fmt::Write as _;

use choreo_aggregate_models::{HazardAggregate, Place, YearAggregate};
use choreo_config::DomainConfig;
use choreo_hazard_models::HazardType;
use choreo_score_models::{Score, ScoreEntry, ScoredHazard};

pub use scale::LogScale;

/// Computes scores for the hazards of a fixed vocabulary.
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    vocabulary: Vec<HazardType>,
}

impl ScoreEngine {
    /// Creates an engine scoring the vocabulary of `config`.
    #[must_use]
    pub fn new(config: &DomainConfig) -> Self {
        Self {
            vocabulary: config.vocabulary().to_vec(),
        }
    }

    /// Derives the score of `place`, one entry per year.
    ///
    /// The place is only read; every entry holds its own copies of the
    /// aggregates it was built from.
    #[must_use]
    pub fn compute_score(&self, place: &Place) -> Score {
        let steps = LogScale::fit(
            place
                .years
                .iter()
                .map(|y| y.total_displaced)
                .max()
                .unwrap_or_default(),
        );
        let repetitions = LogScale::fit(
            place
                .years
                .iter()
                .flat_map(|y| self.vocabulary_aggregates(y))
                .map(|a| a.frequency)
                .max()
                .unwrap_or_default(),
        );

        if steps.is_degenerate() {
            log::debug!("Step scale for {} is degenerate", place.name);
        }

        let entries = place
            .years
            .iter()
            .map(|year| self.score_year(year, steps, repetitions))
            .collect();

        let score = Score::from_entries(entries);
        log::debug!(
            "Scored {}: {} of {} years with movement",
            place.name,
            score.entries().iter().filter(|e| !e.is_empty()).count(),
            score.len()
        );
        score
    }

    /// Aggregates of `year` for vocabulary hazards, in vocabulary order.
    fn vocabulary_aggregates<'a>(
        &'a self,
        year: &'a YearAggregate,
    ) -> impl Iterator<Item = HazardAggregate> + 'a {
        self.vocabulary.iter().map(|&h| *year.hazards.get(h))
    }

    fn score_year(&self, year: &YearAggregate, steps: LogScale, reps: LogScale) -> ScoreEntry {
        let mut disasters: Vec<HazardAggregate> = self
            .vocabulary_aggregates(year)
            .filter(|a| a.frequency > 0 && a.total_displaced > 0)
            .collect();
        disasters.sort_by(|a, b| b.total_displaced.cmp(&a.total_displaced));

        let mut disasters: Vec<ScoredHazard> = disasters
            .into_iter()
            .map(|a| ScoredHazard {
                hazard_type: a.key,
                frequency: a.frequency,
                total_displaced: a.total_displaced,
                repetitions: reps.level(a.frequency),
                steps: steps.level(a.total_displaced),
            })
            .collect();
        disasters.sort_by(|a, b| b.total_displaced.cmp(&a.total_displaced));

        ScoreEntry {
            year: year.year,
            disasters,
        }
    }
}

/// Renders one year of a score as text.
///
/// Each line lists the hazard, its repetitions and frequency, then its steps
/// and displacement.
#[must_use]
pub fn render_score_table(entry: &ScoreEntry) -> String {
    let mut out = format!("{} Logarithmic Movement Score\n", entry.year);
    for disaster in &entry.disasters {
        let _ = writeln!(
            out,
            "{:<24} {} ({})  {} ({})",
            disaster.hazard_type.as_ref(),
            disaster.repetitions,
            thousands(disaster.frequency),
            disaster.steps,
            thousands(disaster.total_displaced),
        );
    }
    out
}

/// Formats `value` with comma thousands separators.
#[must_use]
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use choreo_aggregate_models::{EventDetail, PlaceKind};
    use choreo_hazard_models::CrisisCategory;
    use choreo_score_models::{MAX_LEVEL, MIN_LEVEL};
    use chrono::NaiveDate;

    fn engine() -> ScoreEngine {
        ScoreEngine::new(&DomainConfig::embedded().unwrap())
    }

    fn detail(year: i32, day: u32, hazard: HazardType, displaced: u64) -> EventDetail {
        EventDetail {
            date: NaiveDate::from_ymd_opt(year, 1, day).unwrap(),
            displaced,
            crisis_category: CrisisCategory::WeatherRelated,
            hazard_type: hazard,
            event_label: "unknown".to_owned(),
        }
    }

    fn place(events: &[(i32, HazardType, u64)]) -> Place {
        let years = (2008..=2020)
            .map(|year| {
                let details = events
                    .iter()
                    .enumerate()
                    .filter(|(_, (y, _, _))| *y == year)
                    .map(|(i, &(y, h, d))| detail(y, u32::try_from(i % 28).unwrap() + 1, h, d))
                    .collect();
                YearAggregate::from_details(year, details)
            })
            .collect();
        Place::from_years(
            "Alpha".to_owned(),
            PlaceKind::Region {
                countries: Vec::new(),
            },
            years,
        )
    }

    #[test]
    fn single_active_year() {
        let events: Vec<_> = (0..10).map(|_| (2012, HazardType::Flood, 100)).collect();
        let score = engine().compute_score(&place(&events));

        assert_eq!(score.len(), 13);
        let nonempty: Vec<_> = score.entries().iter().filter(|e| !e.is_empty()).collect();
        assert_eq!(nonempty.len(), 1);
        assert_eq!(nonempty[0].year, 2012);

        let flood = nonempty[0].disasters[0];
        assert_eq!(flood.frequency, 10);
        assert_eq!(flood.total_displaced, 1000);
        assert_eq!(flood.steps, MAX_LEVEL);
        assert_eq!(flood.repetitions, MAX_LEVEL);
    }

    #[test]
    fn levels_stay_in_range() {
        let score = engine().compute_score(&place(&[
            (2008, HazardType::Flood, 1),
            (2008, HazardType::Storm, 9_999_999),
            (2010, HazardType::Drought, 3),
            (2015, HazardType::Earthquake, 250_000),
            (2015, HazardType::Earthquake, 1),
        ]));
        for entry in score.entries() {
            for d in &entry.disasters {
                assert!((MIN_LEVEL..=MAX_LEVEL).contains(&d.steps), "{d:?}");
                assert!((MIN_LEVEL..=MAX_LEVEL).contains(&d.repetitions), "{d:?}");
            }
        }
    }

    #[test]
    fn computing_twice_is_pure() {
        let place = place(&[(2009, HazardType::Flood, 40), (2009, HazardType::Storm, 70)]);
        let before = place.clone();
        let engine = engine();
        assert_eq!(engine.compute_score(&place), engine.compute_score(&place));
        assert_eq!(place, before);
    }

    #[test]
    fn disasters_sorted_and_zeroes_dropped() {
        let score = engine().compute_score(&place(&[
            (2011, HazardType::Flood, 40),
            (2011, HazardType::Storm, 70),
            (2011, HazardType::Wildfire, 0),
            (2011, HazardType::Unknown, 5_000),
        ]));
        let keys: Vec<_> = score.entry(3).unwrap().disasters.iter().map(|d| d.hazard_type).collect();
        assert_eq!(keys, vec![HazardType::Storm, HazardType::Flood]);
    }

    #[test]
    fn ties_keep_vocabulary_order() {
        let score = engine().compute_score(&place(&[
            (2011, HazardType::Drought, 10),
            (2011, HazardType::Flood, 10),
        ]));
        let keys: Vec<_> = score.entry(3).unwrap().disasters.iter().map(|d| d.hazard_type).collect();
        assert_eq!(keys, vec![HazardType::Flood, HazardType::Drought]);
    }

    #[test]
    fn single_event_place_is_degenerate() {
        let score = engine().compute_score(&place(&[(2020, HazardType::Volcano, 1)]));
        let volcano = score.entry(12).unwrap().disasters[0];
        assert_eq!(volcano.steps, MIN_LEVEL);
        assert_eq!(volcano.repetitions, MIN_LEVEL);
    }

    #[test]
    fn table_text() {
        let entry = ScoreEntry {
            year: 2019,
            disasters: vec![ScoredHazard {
                hazard_type: HazardType::MassMovement,
                frequency: 1_204,
                total_displaced: 3_400_000,
                repetitions: 4,
                steps: 5,
            }],
        };
        let text = render_score_table(&entry);
        assert!(text.starts_with("2019 Logarithmic Movement Score\n"));
        assert!(text.contains("Mass movement"));
        assert!(text.contains("4 (1,204)  5 (3,400,000)"), "{text}");
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_000), "1,000");
        assert_eq!(thousands(12_345_678), "12,345,678");
    }
}
