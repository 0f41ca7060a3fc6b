#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Normalized displacement event records and the in-memory event store.
//!
//! Raw rows arrive from the event source exactly as the monitor publishes
//! them: free-text labels, blank cells, and `YYYY-MM-DD...` start stamps.
//! [`EventRecord::from_raw`] folds them into the canonical taxonomy and
//! [`EventStore`] holds the validated, chronologically ordered result.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use choreo_hazard_models::{CrisisCategory, HazardType};
use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// First year covered by the event data.
pub const FIRST_YEAR: i32 = 2008;

/// Last year covered by the event data.
pub const LAST_YEAR: i32 = 2020;

/// Number of yearly buckets every place carries.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub const YEAR_COUNT: usize = (LAST_YEAR - FIRST_YEAR + 1) as usize;

/// Label substituted for blank event names.
pub const UNKNOWN_LABEL: &str = "unknown";

/// The supported year span, inclusive.
#[must_use]
pub const fn year_span() -> RangeInclusive<i32> {
    FIRST_YEAR..=LAST_YEAR
}

/// Errors raised while normalizing or storing events.
#[derive(Debug, Error)]
pub enum EventError {
    /// The `start` stamp is not a `YYYY-MM-DD` date.
    #[error("Event '{label}' in {country}: unparseable date '{raw}'")]
    InvalidDate {
        /// Country of the offending row.
        country: String,
        /// Event label of the offending row.
        label: String,
        /// The raw date text.
        raw: String,
    },

    /// The `year` column is not an integer.
    #[error("Event '{label}' in {country}: invalid year '{raw}'")]
    InvalidYear {
        /// Country of the offending row.
        country: String,
        /// Event label of the offending row.
        label: String,
        /// The raw year text.
        raw: String,
    },

    /// The event year falls outside the supported span.
    #[error(
        "Event '{label}' in {country}: year {year} outside {first}-{last}",
        first = FIRST_YEAR,
        last = LAST_YEAR
    )]
    OutOfSpan {
        /// Country of the offending row.
        country: String,
        /// Event label of the offending row.
        label: String,
        /// The out-of-span year.
        year: i32,
    },

    /// The displaced count is negative or not an integer.
    #[error("Event '{label}' in {country}: invalid displaced count '{raw}'")]
    InvalidDisplaced {
        /// Country of the offending row.
        country: String,
        /// Event label of the offending row.
        label: String,
        /// The raw count text.
        raw: String,
    },

    /// The row has no country name.
    #[error("Event '{label}' has no country")]
    MissingCountry {
        /// Event label of the offending row.
        label: String,
    },
}

/// A row of the event source file, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEventRow {
    /// Country name.
    pub country: String,
    /// ISO 3166 alpha-3 code.
    #[serde(default)]
    pub code: String,
    /// Reporting year the event is counted in; blank falls back to the year
    /// of `start`.
    #[serde(default)]
    pub year: String,
    /// Event start stamp; only the leading `YYYY-MM-DD` is read.
    pub start: String,
    /// Crisis category label, possibly blank.
    #[serde(default)]
    pub crisis_category: String,
    /// Hazard type label, possibly blank.
    #[serde(default)]
    pub hazard_type: String,
    /// People displaced; blank counts as zero.
    #[serde(default)]
    pub displaced: String,
    /// Event name, possibly blank.
    #[serde(default)]
    pub event: String,
}

/// A validated, normalized displacement event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Country name.
    pub country: String,
    /// ISO 3166 alpha-3 code.
    pub iso_code: String,
    /// Reporting year the event is counted in.
    pub year: i32,
    /// Date the event started. Orders events; may precede `year`.
    pub occurred_on: NaiveDate,
    /// Canonical crisis category.
    pub crisis_category: CrisisCategory,
    /// Canonical hazard type.
    pub hazard_type: HazardType,
    /// Number of people displaced.
    pub people_displaced: u64,
    /// Event name, `"unknown"` when blank.
    pub event_label: String,
}

impl EventRecord {
    /// Normalizes a raw row.
    ///
    /// Blank labels become `unknown`, hazard aliases are folded, and blank
    /// displaced counts read as zero. Unrecognized hazard or category labels
    /// are logged and treated as unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the country is blank, the date or year is
    /// unparseable, the year is outside the supported span, or the displaced
    /// count is invalid.
    pub fn from_raw(row: &RawEventRow) -> Result<Self, EventError> {
        let event_label = if row.event.trim().is_empty() {
            UNKNOWN_LABEL.to_owned()
        } else {
            row.event.trim().to_owned()
        };

        let country = row.country.trim();
        if country.is_empty() {
            return Err(EventError::MissingCountry { label: event_label });
        }

        let occurred_on = parse_start(&row.start).ok_or_else(|| EventError::InvalidDate {
            country: country.to_owned(),
            label: event_label.clone(),
            raw: row.start.clone(),
        })?;
        let year = match row.year.trim() {
            "" => occurred_on.year(),
            raw => raw.parse().map_err(|_| EventError::InvalidYear {
                country: country.to_owned(),
                label: event_label.clone(),
                raw: row.year.clone(),
            })?,
        };
        if !year_span().contains(&year) {
            return Err(EventError::OutOfSpan {
                country: country.to_owned(),
                label: event_label,
                year,
            });
        }

        let people_displaced =
            parse_displaced(&row.displaced).ok_or_else(|| EventError::InvalidDisplaced {
                country: country.to_owned(),
                label: event_label.clone(),
                raw: row.displaced.clone(),
            })?;

        let hazard_type = HazardType::canonicalize(&row.hazard_type).unwrap_or_else(|| {
            log::warn!(
                "Unrecognized hazard type '{}' for event '{event_label}'; treating as unknown",
                row.hazard_type
            );
            HazardType::Unknown
        });
        let crisis_category =
            CrisisCategory::canonicalize(&row.crisis_category).unwrap_or_else(|| {
                log::warn!(
                    "Unrecognized crisis category '{}' for event '{event_label}'; treating as unknown",
                    row.crisis_category
                );
                CrisisCategory::Unknown
            });

        Ok(Self {
            country: country.to_owned(),
            iso_code: row.code.trim().to_owned(),
            year,
            occurred_on,
            crisis_category,
            hazard_type,
            people_displaced,
            event_label,
        })
    }

    /// Reporting year the event is counted in.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }
}

fn parse_start(raw: &str) -> Option<NaiveDate> {
    let stamp = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(stamp, "%Y-%m-%d").ok()
}

fn parse_displaced(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0);
    }
    trimmed.parse().ok()
}

/// Validated events, ordered ascending by date.
///
/// Events sharing a date keep their source order.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<EventRecord>,
    skipped: usize,
}

impl EventStore {
    /// Normalizes and stores raw rows.
    ///
    /// A row that fails normalization is logged and skipped; the remaining
    /// rows are still stored. [`EventStore::skipped_rows`] reports how many
    /// were dropped.
    pub fn from_raw_rows<'a>(rows: impl IntoIterator<Item = &'a RawEventRow>) -> Self {
        let mut events = Vec::new();
        let mut skipped = 0;
        for (index, row) in rows.into_iter().enumerate() {
            match EventRecord::from_raw(row) {
                Ok(event) => events.push(event),
                Err(e) => {
                    log::warn!("Skipping event row {}: {e}", index + 1);
                    skipped += 1;
                }
            }
        }
        events.sort_by_key(|e| e.occurred_on);
        log::debug!(
            "Event store holds {} events ({skipped} rows skipped)",
            events.len()
        );
        Self { events, skipped }
    }

    /// Number of raw rows dropped by [`EventStore::from_raw_rows`].
    #[must_use]
    pub const fn skipped_rows(&self) -> usize {
        self.skipped
    }

    /// All events in chronological order.
    #[must_use]
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Number of stored events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Distinct country names in first-seen (chronological) order.
    #[must_use]
    pub fn countries(&self) -> Vec<&str> {
        first_seen(self.events.iter().map(|e| e.country.as_str()))
    }

    /// ISO code of the first event recorded for `country`.
    #[must_use]
    pub fn iso_code_for(&self, country: &str) -> Option<&str> {
        self.events
            .iter()
            .find(|e| e.country == country)
            .map(|e| e.iso_code.as_str())
    }

    /// Events of `country` that started in `year`, chronologically.
    pub fn for_country_year<'a>(
        &'a self,
        country: &'a str,
        year: i32,
    ) -> impl Iterator<Item = &'a EventRecord> + 'a {
        self.events
            .iter()
            .filter(move |e| e.country == country && e.year() == year)
    }

    /// Hazard types present in the data, first-seen order, `unknown` excluded.
    #[must_use]
    pub fn observed_hazards(&self) -> Vec<HazardType> {
        first_seen(
            self.events
                .iter()
                .map(|e| e.hazard_type)
                .filter(|h| h.is_known()),
        )
    }

    /// Crisis categories present in the data, first-seen order.
    #[must_use]
    pub fn observed_categories(&self) -> Vec<CrisisCategory> {
        first_seen(self.events.iter().map(|e| e.crisis_category))
    }
}

fn first_seen<T: Ord + Copy>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = BTreeSet::new();
    items.filter(|item| seen.insert(*item)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(country: &str, start: &str, hazard: &str, displaced: &str) -> RawEventRow {
        RawEventRow {
            country: country.to_owned(),
            code: "ALP".to_owned(),
            year: String::new(),
            start: start.to_owned(),
            crisis_category: "Weather related".to_owned(),
            hazard_type: hazard.to_owned(),
            displaced: displaced.to_owned(),
            event: String::new(),
        }
    }

    #[test]
    fn normalizes_blank_fields() {
        let mut row = raw("Alpha", "2010-03-04", "", "");
        row.crisis_category = String::new();
        let event = EventRecord::from_raw(&row).unwrap();

        assert_eq!(event.hazard_type, HazardType::Unknown);
        assert_eq!(event.crisis_category, CrisisCategory::Unknown);
        assert_eq!(event.event_label, UNKNOWN_LABEL);
        assert_eq!(event.people_displaced, 0);
        assert_eq!(event.year(), 2010);
    }

    #[test]
    fn folds_hazard_aliases() {
        let event = EventRecord::from_raw(&raw("Alpha", "2012-01-01", "Dry mass movement", "7"))
            .unwrap();
        assert_eq!(event.hazard_type, HazardType::MassMovement);
    }

    #[test]
    fn reads_only_leading_date_of_start_stamp() {
        let event =
            EventRecord::from_raw(&raw("Alpha", "2015-06-30T00:00:00", "Flood", "1")).unwrap();
        assert_eq!(
            event.occurred_on,
            NaiveDate::from_ymd_opt(2015, 6, 30).unwrap()
        );
    }

    #[test]
    fn rejects_invalid_rows() {
        assert!(matches!(
            EventRecord::from_raw(&raw("Alpha", "2007-12-31", "Flood", "1")),
            Err(EventError::OutOfSpan { .. })
        ));
        assert!(matches!(
            EventRecord::from_raw(&raw("Alpha", "2021-01-01", "Flood", "1")),
            Err(EventError::OutOfSpan { .. })
        ));
        assert!(matches!(
            EventRecord::from_raw(&raw("Alpha", "soon", "Flood", "1")),
            Err(EventError::InvalidDate { .. })
        ));
        assert!(matches!(
            EventRecord::from_raw(&raw("Alpha", "2010-01-01", "Flood", "-3")),
            Err(EventError::InvalidDisplaced { .. })
        ));
        let mut bad_year = raw("Alpha", "2010-01-01", "Flood", "1");
        bad_year.year = "twenty-ten".to_owned();
        assert!(matches!(
            EventRecord::from_raw(&bad_year),
            Err(EventError::InvalidYear { .. })
        ));
        assert!(matches!(
            EventRecord::from_raw(&raw(" ", "2010-01-01", "Flood", "3")),
            Err(EventError::MissingCountry { .. })
        ));
    }

    #[test]
    fn year_column_decides_the_bucket() {
        let mut row = raw("Alpha", "2007-12-30", "Flood", "100");
        row.year = "2008".to_owned();
        let event = EventRecord::from_raw(&row).unwrap();

        assert_eq!(event.year(), 2008);
        assert_eq!(
            event.occurred_on,
            NaiveDate::from_ymd_opt(2007, 12, 30).unwrap()
        );

        row.year = "2021".to_owned();
        row.start = "2020-12-30".to_owned();
        assert!(matches!(
            EventRecord::from_raw(&row),
            Err(EventError::OutOfSpan { year: 2021, .. })
        ));
    }

    #[test]
    fn invalid_rows_are_skipped_not_fatal() {
        let mut late_start = raw("Alpha", "2007-12-30", "Flood", "100");
        late_start.year = "2008".to_owned();
        let rows = [
            late_start,
            raw("Alpha", "2006-05-01", "Storm", "3"),
            raw("Alpha", "2009-05-01", "Storm", "5"),
        ];
        let store = EventStore::from_raw_rows(&rows);

        assert_eq!(store.len(), 2);
        assert_eq!(store.skipped_rows(), 1);
        assert_eq!(store.for_country_year("Alpha", 2008).count(), 1);
        assert_eq!(store.for_country_year("Alpha", 2007).count(), 0);
    }

    #[test]
    fn unrecognized_hazard_becomes_unknown() {
        let event =
            EventRecord::from_raw(&raw("Alpha", "2010-01-01", "Meteor strike", "3")).unwrap();
        assert_eq!(event.hazard_type, HazardType::Unknown);
    }

    #[test]
    fn store_orders_chronologically_and_tracks_vocabulary() {
        let rows = [
            raw("Beta", "2011-05-01", "Storm", "5"),
            raw("Alpha", "2009-02-01", "Flood", "10"),
            raw("Alpha", "2009-02-01", "", "1"),
            raw("Beta", "2010-01-01", "Flood", "2"),
        ];
        let store = EventStore::from_raw_rows(&rows);

        let dates: Vec<_> = store.events().iter().map(|e| e.occurred_on).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);

        assert_eq!(store.countries(), vec!["Alpha", "Beta"]);
        assert_eq!(
            store.observed_hazards(),
            vec![HazardType::Flood, HazardType::Storm]
        );
        assert_eq!(
            store.observed_categories(),
            vec![CrisisCategory::WeatherRelated]
        );
        assert_eq!(store.skipped_rows(), 0);
        assert_eq!(store.for_country_year("Alpha", 2009).count(), 2);
        assert_eq!(store.for_country_year("Beta", 2009).count(), 0);
        assert_eq!(store.iso_code_for("Beta"), Some("ALP"));
    }
}
