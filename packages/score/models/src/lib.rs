#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Movement score types.
//!
//! A [`Score`] encodes, for each year of a place, how many steps and
//! repetitions each hazard "pose" is danced with. Both levels lie in
//! [`MIN_LEVEL`]`..=`[`MAX_LEVEL`].

use choreo_hazard_models::HazardType;
use serde::{Deserialize, Serialize};

/// Lowest step or repetition count.
pub const MIN_LEVEL: u8 = 1;

/// Highest step or repetition count.
pub const MAX_LEVEL: u8 = 5;

/// One hazard pose within a year of the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredHazard {
    /// Hazard type danced.
    pub hazard_type: HazardType,
    /// Events of this hazard in the year.
    pub frequency: u64,
    /// People displaced by this hazard in the year.
    pub total_displaced: u64,
    /// Times the pose is repeated, from frequency.
    pub repetitions: u8,
    /// Steps taken, from displacement.
    pub steps: u8,
}

/// The poses of a single year, descending by displacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    /// Calendar year.
    pub year: i32,
    /// Hazards with nonzero frequency and displacement.
    pub disasters: Vec<ScoredHazard>,
}

impl ScoreEntry {
    /// Whether nothing happened this year.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.disasters.is_empty()
    }
}

/// One [`ScoreEntry`] per year, ascending by year.
///
/// A score is immutable once built: derivations clone entries out of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score {
    entries: Vec<ScoreEntry>,
}

impl Score {
    /// Wraps entries; they are sorted ascending by year.
    #[must_use]
    pub fn from_entries(mut entries: Vec<ScoreEntry>) -> Self {
        entries.sort_by_key(|e| e.year);
        Self { entries }
    }

    /// All entries, ascending by year.
    #[must_use]
    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// The entry at `index` (0 is the first year).
    #[must_use]
    pub fn entry(&self, index: usize) -> Option<&ScoreEntry> {
        self.entries.get(index)
    }

    /// Number of years covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the score covers no years.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
