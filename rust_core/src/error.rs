//! Error taxonomy for pick generation.
//!
//! Every variant is fatal for the invocation that raised it: there is no
//! per-game partial success. Variants carry the identifiers an operator needs
//! to find the inconsistency without re-running with extra logging.

use crate::models::{ModelId, PickCategory, PredictionId, RankingMetric, SlateId, TeamId};
use std::fmt;
use thiserror::Error;

/// Which lookup index a team identifier was searched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSide {
    /// The canonical home-team index.
    Home,
    /// The canonical road-team index.
    Road,
    /// Both indices (the declared home team matched neither).
    Either,
}

impl fmt::Display for IndexSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexSide::Home => write!(f, "home"),
            IndexSide::Road => write!(f, "road"),
            IndexSide::Either => write!(f, "home or road"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PickError {
    // Input resolution errors
    #[error("slate '{0}' not found")]
    SlateNotFound(SlateId),

    #[error("picker '{0}' not found")]
    PickerNotFound(String),

    #[error("model '{model}' requested for {category} picks not found")]
    ModelNotFound { category: PickCategory, model: ModelId },

    #[error("no model ranked by {metric} available for {category} picks")]
    NoRankedModel {
        category: PickCategory,
        metric: RankingMetric,
    },

    #[error("model '{model}' has an unusable calibration (bias={bias}, std_dev={std_dev})")]
    InvalidCalibration {
        model: ModelId,
        bias: f64,
        std_dev: f64,
    },

    #[error("slate row {row} is malformed: {reason}")]
    InvalidDeclaredGame { row: u32, reason: String },

    // Matchup resolution errors
    #[error("team '{team}' not found in the {searched} index of model '{model}'")]
    TeamNotFound {
        team: TeamId,
        searched: IndexSide,
        model: ModelId,
    },

    #[error(
        "'{home}' and '{road}' are not playing each other in model '{model}' \
         (predictions '{home_prediction}' and '{road_prediction}')"
    )]
    MismatchedMatchup {
        home: TeamId,
        road: TeamId,
        home_prediction: PredictionId,
        road_prediction: PredictionId,
        model: ModelId,
    },
}

pub type PickResult<T> = std::result::Result<T, PickError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_matchup_names_both_teams() {
        let err = PickError::MismatchedMatchup {
            home: TeamId::from("ohio-state"),
            road: TeamId::from("iowa"),
            home_prediction: PredictionId::from("p1"),
            road_prediction: PredictionId::from("p7"),
            model: ModelId::from("line"),
        };
        let msg = err.to_string();
        assert!(msg.contains("ohio-state"));
        assert!(msg.contains("iowa"));
        assert!(msg.contains("line"));
    }

    #[test]
    fn test_team_not_found_names_index() {
        let err = PickError::TeamNotFound {
            team: TeamId::from("purdue"),
            searched: IndexSide::Either,
            model: ModelId::from("sagarin"),
        };
        assert_eq!(
            err.to_string(),
            "team 'purdue' not found in the home or road index of model 'sagarin'"
        );
    }
}
