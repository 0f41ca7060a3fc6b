#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hazard type and crisis category taxonomy for displacement events.
//!
//! This crate defines the closed vocabularies every other crate keys its
//! aggregates by. Raw source labels are folded into these canonical types
//! once, at normalization time, so that downstream lookups are enum-indexed
//! instead of string-matched.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A key that an aggregate table can be indexed by.
///
/// Implementors are closed, fieldless enums whose [`AggregateKey::ALL`]
/// lists every variant in declaration order, so that `ALL[k.ordinal()] == k`.
pub trait AggregateKey: Copy + Eq + Ord + std::fmt::Debug + 'static {
    /// Every key, in declaration order.
    const ALL: &'static [Self];

    /// Position of this key within [`AggregateKey::ALL`].
    fn ordinal(self) -> usize;
}

/// Canonical hazard types.
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
#[strum(ascii_case_insensitive)]
pub enum HazardType {
    Flood,
    Storm,
    Wildfire,
    Earthquake,
    Volcano,
    Drought,
    #[serde(rename = "Mass movement")]
    #[strum(serialize = "Mass movement")]
    MassMovement,
    #[serde(rename = "Extreme temperature")]
    #[strum(serialize = "Extreme temperature")]
    ExtremeTemperature,
    #[serde(rename = "Severe winter condition")]
    #[strum(serialize = "Severe winter condition")]
    SevereWinterCondition,
    /// Blank or unrecognized hazard label.
    #[serde(rename = "unknown")]
    #[strum(serialize = "unknown")]
    Unknown,
}

/// Raw hazard labels that collapse into a single canonical type.
///
/// Matched exactly, before the case-insensitive canonical parse.
pub const HAZARD_FOLDS: &[(&str, HazardType)] = &[
    ("Wet Mass movement", HazardType::MassMovement),
    ("Wet Mass Movement", HazardType::MassMovement),
    ("Wet mass movement", HazardType::MassMovement),
    ("Dry mass movement", HazardType::MassMovement),
    ("Volcanic activity", HazardType::Volcano),
    ("Volcanic eruption", HazardType::Volcano),
];

impl HazardType {
    /// Canonicalizes a raw source label.
    ///
    /// Blank labels become [`HazardType::Unknown`]. Returns `None` when the
    /// label is neither a folded alias nor a canonical name, leaving the
    /// caller to decide how to treat it.
    #[must_use]
    pub fn canonicalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Some(Self::Unknown);
        }

        if let Some((_, folded)) = HAZARD_FOLDS.iter().find(|(alias, _)| *alias == trimmed) {
            return Some(*folded);
        }

        Self::from_str(trimmed).ok()
    }

    /// Returns `true` for every type except [`HazardType::Unknown`].
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl AggregateKey for HazardType {
    const ALL: &'static [Self] = &[
        Self::Flood,
        Self::Storm,
        Self::Wildfire,
        Self::Earthquake,
        Self::Volcano,
        Self::Drought,
        Self::MassMovement,
        Self::ExtremeTemperature,
        Self::SevereWinterCondition,
        Self::Unknown,
    ];

    fn ordinal(self) -> usize {
        self as usize
    }
}

/// Crisis categories as reported by the displacement monitor.
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
#[strum(ascii_case_insensitive)]
pub enum CrisisCategory {
    #[serde(rename = "Weather related")]
    #[strum(serialize = "Weather related")]
    WeatherRelated,
    Geophysical,
    #[serde(rename = "unknown")]
    #[strum(serialize = "unknown")]
    Unknown,
}

impl CrisisCategory {
    /// Canonicalizes a raw source label. Blank labels become
    /// [`CrisisCategory::Unknown`]; unrecognized labels return `None`.
    #[must_use]
    pub fn canonicalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Some(Self::Unknown);
        }
        Self::from_str(trimmed).ok()
    }
}

impl AggregateKey for CrisisCategory {
    const ALL: &'static [Self] = &[Self::WeatherRelated, Self::Geophysical, Self::Unknown];

    fn ordinal(self) -> usize {
        self as usize
    }
}

/// A `#RRGGBB` color, stored in its canonical uppercase form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// The color as a `#RRGGBB` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Error returned when a string is not a `#RRGGBB` color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidColorError {
    /// The rejected input.
    pub value: String,
}

impl std::fmt::Display for InvalidColorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid color '{}': expected #RRGGBB", self.value)
    }
}

impl std::error::Error for InvalidColorError {}

impl FromStr for HexColor {
    type Err = InvalidColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').unwrap_or_default();
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InvalidColorError {
                value: s.to_owned(),
            });
        }
        Ok(Self(format!("#{}", digits.to_ascii_uppercase())))
    }
}

impl TryFrom<String> for HexColor {
    type Error = InvalidColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

impl std::fmt::Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
