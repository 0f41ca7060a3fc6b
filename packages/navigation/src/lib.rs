#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The navigation state machine.
//!
//! A [`Navigator`] owns the only mutable selection state of a session: which
//! ranked place is selected, which year is shown, and which hazard layers
//! are revealed. It accepts [`Command`]s and answers each one with a
//! [`Transition`] carrying a complete, self-consistent [`ViewModel`].
//! Invalid commands are rejected as values and leave the state untouched.

pub mod layers;

use choreo_aggregate_models::{Place, RankingResult, YearAggregate};
use choreo_config::DomainConfig;
use choreo_event_models::{FIRST_YEAR, YEAR_COUNT};
use choreo_hazard_models::HazardType;
use choreo_navigation_models::{
    Command, NavigationState, PlaceLabel, Pose, RejectReason, RenderMode, Transition,
    TransitionOutcome, ViewModel,
};
use choreo_score::ScoreEngine;
use choreo_score_models::{Score, ScoreEntry};
use thiserror::Error;

/// Years moved by one `Advance` or `Retreat`.
pub const YEAR_STEP: usize = 2;

/// Highest year index; the last year of the span.
pub const MAX_YEAR_INDEX: usize = YEAR_COUNT - 1;

/// Errors from [`Navigator::new`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    /// The ranking selected nothing to navigate.
    #[error("Ranking contains no places to navigate")]
    NoPlaces,
}

/// Session state over a [`RankingResult`].
#[derive(Debug)]
pub struct Navigator<'a> {
    config: &'a DomainConfig,
    ranking: &'a RankingResult,
    engine: ScoreEngine,
    score: Score,
    state: NavigationState,
    pose: Pose,
    all_years: bool,
}

impl<'a> Navigator<'a> {
    /// Starts a session on the first ranked place and the first year, with
    /// every hazard visible.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::NoPlaces`] if the ranking is empty.
    pub fn new(
        config: &'a DomainConfig,
        ranking: &'a RankingResult,
    ) -> Result<Self, NavigationError> {
        let first = ranking.top_places.first().ok_or(NavigationError::NoPlaces)?;
        let engine = ScoreEngine::new(config);
        let score = engine.compute_score(first);
        let vocabulary = config.vocabulary().to_vec();

        Ok(Self {
            config,
            ranking,
            engine,
            score,
            state: NavigationState {
                selected_place_index: 0,
                year_index: 0,
                active_hazard_filter: None,
                visible_colors: config.color_entries(&vocabulary),
                visible_hazards: vocabulary,
            },
            pose: Pose::None,
            all_years: false,
        })
    }

    /// Current selection.
    #[must_use]
    pub const fn state(&self) -> &NavigationState {
        &self.state
    }

    /// Score of the selected place.
    #[must_use]
    pub const fn score(&self) -> &Score {
        &self.score
    }

    /// The selected place.
    #[must_use]
    pub fn place(&self) -> &'a Place {
        &self.ranking.top_places[self.state.selected_place_index]
    }

    /// Calendar year of the current year index.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub const fn current_year(&self) -> i32 {
        FIRST_YEAR + self.state.year_index as i32
    }

    /// Hazards with displacement in the current year of the selected place,
    /// most displacing first.
    #[must_use]
    pub fn stacked_keys(&self) -> Vec<HazardType> {
        self.current_year_aggregate()
            .map(|y| y.hazards.stacked_keys())
            .unwrap_or_default()
    }

    /// Applies the command bound to `key`. Unbound keys are ignored.
    pub fn apply_key(&mut self, key: &str) -> Option<Transition> {
        let Some(command) = self.config.command_for_key(key) else {
            log::debug!("Ignoring unbound key '{key}'");
            return None;
        };
        Some(self.apply(command))
    }

    /// Applies `command` and returns the resulting view.
    pub fn apply(&mut self, command: Command) -> Transition {
        self.all_years = false;

        let outcome = match command {
            Command::SelectNext => self.select_next(),
            Command::SelectPrevious => self.select_previous(),
            Command::Advance => self.advance(),
            Command::Retreat => self.retreat(),
            Command::FilterByHazard(hazard) => self.filter_by_hazard(hazard),
            Command::ClearFilter => self.clear_filter(),
        };

        match outcome {
            TransitionOutcome::Rejected { reason } => {
                log::warn!("Rejected {command}: {reason}");
            }
            TransitionOutcome::Applied | TransitionOutcome::Unchanged => {
                log::debug!(
                    "{command} -> {outcome:?} (place {}, year {})",
                    self.state.selected_place_index,
                    self.current_year()
                );
            }
        }

        Transition {
            command,
            outcome,
            view: self.view(),
        }
    }

    fn select_next(&mut self) -> TransitionOutcome {
        let next = self.state.selected_place_index + 1;
        if next >= self.ranking.top_places.len() {
            return rejected(RejectReason::AtLastPlace);
        }
        self.select_place(next);
        TransitionOutcome::Applied
    }

    fn select_previous(&mut self) -> TransitionOutcome {
        let Some(previous) = self.state.selected_place_index.checked_sub(1) else {
            return rejected(RejectReason::AtFirstPlace);
        };
        self.select_place(previous);
        TransitionOutcome::Applied
    }

    fn select_place(&mut self, index: usize) {
        self.state.selected_place_index = index;
        self.state.year_index = 0;
        self.reset_visible();
        self.pose = Pose::None;
        self.score = self.engine.compute_score(self.place());
    }

    fn advance(&mut self) -> TransitionOutcome {
        if self.state.year_index >= MAX_YEAR_INDEX {
            self.all_years = true;
            return TransitionOutcome::Unchanged;
        }
        self.state.year_index = (self.state.year_index + YEAR_STEP).min(MAX_YEAR_INDEX);
        self.reset_visible();
        self.pose = Pose::None;
        TransitionOutcome::Applied
    }

    fn retreat(&mut self) -> TransitionOutcome {
        if self.state.year_index < YEAR_STEP {
            return rejected(RejectReason::AtFirstYear);
        }
        self.state.year_index -= YEAR_STEP;
        self.reset_visible();
        self.pose = Pose::None;
        TransitionOutcome::Applied
    }

    fn filter_by_hazard(&mut self, hazard: HazardType) -> TransitionOutcome {
        if !self.stacked_keys().contains(&hazard) {
            return rejected(RejectReason::HazardNotStacked { hazard });
        }

        if self.state.is_filtered() {
            if self.state.visible_hazards.contains(&hazard) {
                return TransitionOutcome::Unchanged;
            }
            self.state.visible_hazards.push(hazard);
        } else {
            self.state.visible_hazards = vec![hazard];
        }

        self.state.active_hazard_filter = Some(hazard);
        self.state.visible_colors = self.config.color_entries(&self.state.visible_hazards);
        self.pose = Pose::Hazard(hazard);
        TransitionOutcome::Applied
    }

    fn clear_filter(&mut self) -> TransitionOutcome {
        if !self.state.is_filtered() && self.pose == Pose::Neutral {
            return TransitionOutcome::Unchanged;
        }
        self.reset_visible();
        self.pose = Pose::Neutral;
        TransitionOutcome::Applied
    }

    fn reset_visible(&mut self) {
        let vocabulary = self.config.vocabulary();
        self.state.active_hazard_filter = None;
        self.state.visible_hazards = vocabulary.to_vec();
        self.state.visible_colors = self.config.color_entries(vocabulary);
    }

    fn current_year_aggregate(&self) -> Option<&'a YearAggregate> {
        self.place().years.get(self.state.year_index)
    }

    /// Snapshot of the current selection for the render surface.
    #[must_use]
    pub fn view(&self) -> ViewModel {
        let place = self.place();
        let year = self.current_year();
        let visible = &self.state.visible_hazards;

        let (mode, layers) = if self.all_years {
            let last = place.years.last().map_or(year, |y| y.year);
            (RenderMode::AllYears, layers::span_layers(place, last, visible))
        } else if self.state.is_filtered() {
            let layers = self
                .current_year_aggregate()
                .map(|y| layers::date_layers(y, visible))
                .unwrap_or_default();
            (RenderMode::Focused { year }, layers)
        } else {
            let span = self.state.year_index.max(1);
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let last = FIRST_YEAR + span as i32;
            (RenderMode::Year { year }, layers::span_layers(place, last, visible))
        };

        let score_entry = self
            .score
            .entry(self.state.year_index)
            .cloned()
            .unwrap_or_else(|| ScoreEntry {
                year,
                disasters: Vec::new(),
            });

        ViewModel {
            label: PlaceLabel {
                granularity: self.ranking.granularity,
                name: place.name.clone(),
            },
            place_index: self.state.selected_place_index,
            year_index: self.state.year_index,
            mode,
            pose: self.pose,
            stacked_keys: self.stacked_keys(),
            layers,
            score_entry,
            visible_hazards: visible.clone(),
            colors: self.state.visible_colors.clone(),
        }
    }
}

const fn rejected(reason: RejectReason) -> TransitionOutcome {
    TransitionOutcome::Rejected { reason }
}
