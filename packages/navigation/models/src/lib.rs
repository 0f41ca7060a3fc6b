#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command, state, and view model types for score navigation.
//!
//! The command set is closed: [`Command`] is the entire external API of the
//! navigator. Every command produces a [`Transition`] holding the outcome and
//! a complete [`ViewModel`] snapshot for the render surface.

use choreo_geography_models::Granularity;
use choreo_hazard_models::{HazardType, HexColor};
use choreo_score_models::ScoreEntry;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A navigation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "command", content = "hazard", rename_all = "camelCase")]
pub enum Command {
    /// Move to the next ranked place.
    SelectNext,
    /// Move to the previous ranked place.
    SelectPrevious,
    /// Step forward two years; past the last year, show all years.
    Advance,
    /// Step back two years.
    Retreat,
    /// Reveal one more hazard layer.
    FilterByHazard(HazardType),
    /// Show every hazard layer again.
    ClearFilter,
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelectNext => f.write_str("SelectNext"),
            Self::SelectPrevious => f.write_str("SelectPrevious"),
            Self::Advance => f.write_str("Advance"),
            Self::Retreat => f.write_str("Retreat"),
            Self::FilterByHazard(hazard) => write!(f, "FilterByHazard({hazard})"),
            Self::ClearFilter => f.write_str("ClearFilter"),
        }
    }
}

/// Why a command left the state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum RejectReason {
    /// `SelectPrevious` on the first place.
    AtFirstPlace,
    /// `SelectNext` on the last place.
    AtLastPlace,
    /// `Retreat` on the first year.
    AtFirstYear,
    /// `FilterByHazard` for a hazard with no layer in the current year.
    HazardNotStacked {
        /// The rejected hazard.
        hazard: HazardType,
    },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AtFirstPlace => f.write_str("already at the first place"),
            Self::AtLastPlace => f.write_str("already at the last place"),
            Self::AtFirstYear => f.write_str("already at the first year"),
            Self::HazardNotStacked { hazard } => {
                write!(f, "{hazard} is not stacked in the current year")
            }
        }
    }
}

/// What a command did to the navigation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum TransitionOutcome {
    /// The state changed.
    Applied,
    /// The command was valid but changed nothing.
    Unchanged,
    /// The command was invalid here; the state is untouched.
    Rejected {
        /// Why.
        reason: RejectReason,
    },
}

impl TransitionOutcome {
    /// Whether the command was rejected.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Current selection. Owned and mutated only by the navigator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    /// Index into the ranked places.
    pub selected_place_index: usize,
    /// Even year offset from the first year, `0..=12`.
    pub year_index: usize,
    /// Last hazard accepted by `FilterByHazard` since the latest reset.
    pub active_hazard_filter: Option<HazardType>,
    /// Hazards whose layers are shown, in reveal order.
    pub visible_hazards: Vec<HazardType>,
    /// Colors of the visible hazards.
    pub visible_colors: Vec<ColorEntry>,
}

impl NavigationState {
    /// Whether `FilterByHazard` has narrowed the visible set since the
    /// latest reset.
    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        self.active_hazard_filter.is_some()
    }
}

/// A hazard and the color it is drawn in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorEntry {
    /// Hazard type.
    pub hazard_type: HazardType,
    /// Fill color.
    pub color: HexColor,
}

/// How the render surface should lay out the current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum RenderMode {
    /// The years up to the current one, every visible layer.
    Year {
        /// Current calendar year.
        year: i32,
    },
    /// A single year by event date, narrowed to the revealed hazards.
    Focused {
        /// Current calendar year.
        year: i32,
    },
    /// Every year at once.
    AllYears,
}

/// The x-position of a layer row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerPeriod {
    /// A calendar year.
    Year(i32),
    /// A single event date.
    Date(NaiveDate),
}

/// Displacement per stacked key at one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerRow {
    /// Where the row sits on the time axis.
    pub period: LayerPeriod,
    /// People displaced, aligned with [`StackLayers::keys`].
    pub values: Vec<u64>,
}

/// Stacked-area input: one series per key, one row per period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackLayers {
    /// Layer keys, bottom to top.
    pub keys: Vec<HazardType>,
    /// Rows in ascending period order.
    pub rows: Vec<LayerRow>,
}

/// Heading text for the selected place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceLabel {
    /// Level the place was ranked at.
    pub granularity: Granularity,
    /// Place name.
    pub name: String,
}

impl std::fmt::Display for PlaceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// The pose label shown beside the chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "pose", content = "hazard", rename_all = "camelCase")]
pub enum Pose {
    /// Nothing chosen since the last reset.
    #[default]
    None,
    /// Filter cleared by the neutral pose.
    Neutral,
    /// A hazard pose was accepted.
    Hazard(HazardType),
}

impl std::fmt::Display for Pose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Neutral => f.write_str("Neutral"),
            Self::Hazard(hazard) => write!(f, "{hazard}"),
        }
    }
}

/// Everything the render surface needs after a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    /// Selected place.
    pub label: PlaceLabel,
    /// Index of the selected place among the ranked places.
    pub place_index: usize,
    /// Even year offset of the current year.
    pub year_index: usize,
    /// Layout mode.
    pub mode: RenderMode,
    /// Current pose label.
    pub pose: Pose,
    /// Hazards stacked in the current year.
    pub stacked_keys: Vec<HazardType>,
    /// Layer data restricted to the visible hazards.
    pub layers: StackLayers,
    /// Score row of the current year.
    pub score_entry: ScoreEntry,
    /// Visible hazards, in reveal order.
    pub visible_hazards: Vec<HazardType>,
    /// Colors of the visible hazards.
    pub colors: Vec<ColorEntry>,
}

/// The result of applying one [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    /// The command applied.
    pub command: Command,
    /// What it did.
    pub outcome: TransitionOutcome,
    /// Snapshot after the command.
    pub view: ViewModel,
}
