//! Logarithmic mapping from counts onto score levels.

use choreo_score_models::{MAX_LEVEL, MIN_LEVEL};

/// Maps `[1, max]` logarithmically onto `MIN_LEVEL..=MAX_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogScale {
    max: f64,
}

impl LogScale {
    /// Fits a scale whose domain is `[1, max]`. The lower bound is always 1;
    /// a `max` below 1 is raised to 1.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(max: u64) -> Self {
        Self {
            max: (max as f64).max(1.0),
        }
    }

    /// Whether the domain has collapsed to a single point.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.max <= 1.0
    }

    /// The level for `value`, rounded to the nearest integer and clamped to
    /// the level range. A degenerate domain always yields [`MIN_LEVEL`].
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn level(&self, value: u64) -> u8 {
        if self.is_degenerate() || value <= 1 {
            return MIN_LEVEL;
        }

        let low = f64::from(MIN_LEVEL);
        let high = f64::from(MAX_LEVEL);
        let t = (value as f64).ln() / self.max.ln();
        let scaled = (high - low).mul_add(t, low).round();

        scaled.clamp(low, high) as u8
    }
}
