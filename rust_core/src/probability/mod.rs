//! Calibrated Win Probability
//!
//! Converts a predicted scoring margin into a win probability using the
//! model's Normal error distribution (mean = bias, sd = std_dev).
//!
//! All margins here are in canonical orientation. Declared thresholds are
//! re-oriented through [`Orientation`] before they are subtracted, so the same
//! sign convention holds whichever team the slate called "home".

use crate::error::{PickError, PickResult};
use crate::models::{ModelCalibration, ModelId, Orientation};
use statrs::distribution::{ContinuousCDF, Normal};

/// Normal error distribution bound to one model's prediction set.
#[derive(Debug, Clone)]
pub struct MarginModel {
    calibration: ModelCalibration,
    normal: Normal,
}

impl MarginModel {
    pub fn new(model: &ModelId, calibration: ModelCalibration) -> PickResult<Self> {
        let ModelCalibration { bias, std_dev } = calibration;
        let invalid = || PickError::InvalidCalibration {
            model: model.clone(),
            bias,
            std_dev,
        };

        if !bias.is_finite() || !std_dev.is_finite() || std_dev <= 0.0 {
            return Err(invalid());
        }
        let normal = Normal::new(bias, std_dev).map_err(|_| invalid())?;

        Ok(Self {
            calibration,
            normal,
        })
    }

    pub fn calibration(&self) -> ModelCalibration {
        self.calibration
    }

    /// Probability that the side the margin is oriented to wins (or covers).
    ///
    /// A margin equal to the bias yields exactly 0.5.
    pub fn probability(&self, margin: f64) -> f64 {
        self.normal.cdf(margin).clamp(0.0, 1.0)
    }
}

/// Canonical margin against a declared threshold.
///
/// `declared_threshold` is relative to the slate's home team; a swapped
/// matchup negates it before it is subtracted from the canonical spread.
#[inline]
pub fn threshold_margin(spread: f64, declared_threshold: i32, orientation: Orientation) -> f64 {
    spread - orientation.to_canonical(declared_threshold as f64)
}

/// Margin oriented to the declared underdog.
#[inline]
pub fn underdog_margin(spread: f64, orientation: Orientation) -> f64 {
    orientation.to_canonical(spread)
}
