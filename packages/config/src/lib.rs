#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Immutable domain configuration.
//!
//! A [`DomainConfig`] is built once at startup, either from the embedded
//! `domain.toml` or from a user-supplied file with the same schema, and is
//! then shared by reference with the aggregator, the score engine, and the
//! navigator. Nothing mutates it after [`DomainConfig::from_toml_str`]
//! returns.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use choreo_geography_models::{GeographyOverride, Granularity};
use choreo_hazard_models::{AggregateKey as _, HazardType, HexColor};
use choreo_navigation_models::{ColorEntry, Command};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The configuration compiled into the binary.
const EMBEDDED_TOML: &str = include_str!("../domain.toml");

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The TOML did not match the schema.
    #[error("Invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A hazard is listed more than once.
    #[error("Hazard '{0}' is listed more than once")]
    DuplicateHazard(HazardType),

    /// A known hazard is missing from the vocabulary.
    #[error("Hazard '{0}' is missing from the vocabulary")]
    MissingHazard(HazardType),

    /// `unknown` was listed as a vocabulary hazard.
    #[error("'unknown' cannot be part of the hazard vocabulary; set unknown_color instead")]
    UnknownInVocabulary,

    /// Two commands share a key.
    #[error("Key '{0}' is bound more than once")]
    DuplicateKey(String),

    /// The default ranking size is zero.
    #[error("Ranking max must be at least 1")]
    InvalidRankingMax,
}

/// Default ranking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingDefaults {
    /// Level to rank places at.
    pub granularity: Granularity,
    /// Number of top places to select.
    pub max: usize,
}

/// One hazard of the vocabulary as written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardEntry {
    /// Hazard type.
    pub hazard: HazardType,
    /// Legend and layer color.
    pub color: HexColor,
    /// Key that reveals this hazard's layer.
    pub key: Option<String>,
}

/// Keys bound to the non-hazard commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationKeys {
    /// Key for `SelectNext`.
    pub next_place: String,
    /// Key for `SelectPrevious`.
    pub previous_place: String,
    /// Key for `Advance`.
    pub advance: String,
    /// Key for `Retreat`.
    pub retreat: String,
    /// Key for `ClearFilter`.
    pub clear_filter: String,
}

/// The configuration file schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfigFile {
    /// Color for events without a known hazard type.
    pub unknown_color: HexColor,
    /// Default ranking parameters.
    pub ranking: RankingDefaults,
    /// Navigation key bindings.
    pub keys: NavigationKeys,
    /// Hazard vocabulary in legend order.
    pub hazards: Vec<HazardEntry>,
    /// Manual geography assignments.
    #[serde(default)]
    pub geography_overrides: Vec<GeographyOverride>,
}

/// Validated, immutable domain configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainConfig {
    vocabulary: Vec<HazardType>,
    colors: BTreeMap<HazardType, HexColor>,
    bindings: BTreeMap<String, Command>,
    geography_overrides: Vec<GeographyOverride>,
    ranking: RankingDefaults,
}

impl DomainConfig {
    /// The configuration compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded TOML is invalid.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(EMBEDDED_TOML)
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Loading domain config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Parses and validates configuration TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: DomainConfigFile = toml::de::from_str(text)?;
        Self::from_file(file)
    }

    /// Validates a parsed configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if a hazard is duplicated or missing, `unknown` is
    /// listed in the vocabulary, a key is bound twice, or the ranking max is
    /// zero.
    pub fn from_file(file: DomainConfigFile) -> Result<Self, ConfigError> {
        if file.ranking.max == 0 {
            return Err(ConfigError::InvalidRankingMax);
        }

        let mut vocabulary = Vec::with_capacity(file.hazards.len());
        let mut colors = BTreeMap::new();
        let mut bindings = BTreeMap::new();

        for entry in file.hazards {
            if !entry.hazard.is_known() {
                return Err(ConfigError::UnknownInVocabulary);
            }
            if colors.insert(entry.hazard, entry.color).is_some() {
                return Err(ConfigError::DuplicateHazard(entry.hazard));
            }
            vocabulary.push(entry.hazard);
            if let Some(key) = entry.key {
                bind(&mut bindings, key, Command::FilterByHazard(entry.hazard))?;
            }
        }

        if let Some(missing) = HazardType::ALL
            .iter()
            .find(|h| h.is_known() && !colors.contains_key(*h))
        {
            return Err(ConfigError::MissingHazard(*missing));
        }
        colors.insert(HazardType::Unknown, file.unknown_color);

        let keys = file.keys;
        bind(&mut bindings, keys.next_place, Command::SelectNext)?;
        bind(&mut bindings, keys.previous_place, Command::SelectPrevious)?;
        bind(&mut bindings, keys.advance, Command::Advance)?;
        bind(&mut bindings, keys.retreat, Command::Retreat)?;
        bind(&mut bindings, keys.clear_filter, Command::ClearFilter)?;

        let mut seen = BTreeSet::new();
        let geography_overrides: Vec<GeographyOverride> = file
            .geography_overrides
            .into_iter()
            .filter(|o| seen.insert(o.country.clone()))
            .collect();

        log::debug!(
            "Domain config: {} hazards, {} key bindings, {} geography overrides",
            vocabulary.len(),
            bindings.len(),
            geography_overrides.len()
        );

        Ok(Self {
            vocabulary,
            colors,
            bindings,
            geography_overrides,
            ranking: file.ranking,
        })
    }

    /// Known hazard types in legend order.
    #[must_use]
    pub fn vocabulary(&self) -> &[HazardType] {
        &self.vocabulary
    }

    /// Color of `hazard`, including `unknown`.
    #[must_use]
    pub fn color(&self, hazard: HazardType) -> Option<&HexColor> {
        self.colors.get(&hazard)
    }

    /// Color entries for `hazards`, in the given order.
    #[must_use]
    pub fn color_entries(&self, hazards: &[HazardType]) -> Vec<ColorEntry> {
        hazards
            .iter()
            .filter_map(|&hazard_type| {
                self.color(hazard_type).map(|color| ColorEntry {
                    hazard_type,
                    color: color.clone(),
                })
            })
            .collect()
    }

    /// The command bound to `key`, if any.
    #[must_use]
    pub fn command_for_key(&self, key: &str) -> Option<Command> {
        self.bindings.get(key).copied()
    }

    /// Every key binding, ordered by key.
    pub fn key_bindings(&self) -> impl Iterator<Item = (&str, Command)> {
        self.bindings.iter().map(|(key, command)| (key.as_str(), *command))
    }

    /// Manual geography assignments, first entry per country.
    #[must_use]
    pub fn geography_overrides(&self) -> &[GeographyOverride] {
        &self.geography_overrides
    }

    /// Default ranking parameters.
    #[must_use]
    pub const fn ranking(&self) -> RankingDefaults {
        self.ranking
    }
}

fn bind(
    bindings: &mut BTreeMap<String, Command>,
    key: String,
    command: Command,
) -> Result<(), ConfigError> {
    if bindings.contains_key(&key) {
        return Err(ConfigError::DuplicateKey(key));
    }
    bindings.insert(key, command);
    Ok(())
}
