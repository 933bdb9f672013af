//! Pick Decision Engine
//!
//! Classifies every declared game of a slate against the model chosen for its
//! category, then selects the single superdog. The engine is pure: models and
//! games are passed in, pick records come out, and a failure on any game
//! fails the whole slate.

pub mod aggregate;
pub mod classify;
pub mod superdog;

pub use aggregate::assemble_aggregate;
pub use classify::{classify_game, NeutralSite, Selection};
pub use superdog::{best_expected_value, select_superdog};

use crate::error::PickResult;
use crate::matching::MatchupIndex;
use crate::models::{
    ClassifiedPick, DeclaredGame, ModelId, NoisySpreadPick, StraightUpPick, SuperdogPick,
};
use crate::probability::MarginModel;
use crate::selection::CategoryModels;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

/// Picks for one slate, split by category and kept in row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedSlate {
    pub straight_up: Vec<StraightUpPick>,
    pub noisy_spread: Vec<NoisySpreadPick>,
    pub superdogs: Vec<SuperdogPick>,
}

impl ClassifiedSlate {
    pub fn len(&self) -> usize {
        self.straight_up.len() + self.noisy_spread.len() + self.superdogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, pick: ClassifiedPick) {
        match pick {
            ClassifiedPick::StraightUp(p) => self.straight_up.push(p),
            ClassifiedPick::NoisySpread(p) => self.noisy_spread.push(p),
            ClassifiedPick::Superdog(p) => self.superdogs.push(p),
        }
    }
}

/// Lookup tables and error model for one prediction set.
struct ModelContext<'a> {
    index: MatchupIndex<'a>,
    margins: MarginModel,
}

pub struct PickEngine<'a> {
    models: &'a CategoryModels,
}

impl<'a> PickEngine<'a> {
    pub fn new(models: &'a CategoryModels) -> Self {
        Self { models }
    }

    /// Classify `games` and select the superdog.
    ///
    /// Each distinct model is indexed once, even when it serves several
    /// categories.
    pub fn run(&self, games: &[DeclaredGame]) -> PickResult<ClassifiedSlate> {
        let mut contexts: FxHashMap<&'a ModelId, ModelContext<'a>> = FxHashMap::default();
        let mut slate = ClassifiedSlate::default();

        for game in games {
            let bundle = self.models.get(game.category());
            let id = bundle.id();

            if !contexts.contains_key(id) {
                let margins = MarginModel::new(id, bundle.calibration())?;
                let index = MatchupIndex::new(bundle);
                debug!(
                    "Indexed model {} ({} predictions, bias={}, sd={})",
                    id,
                    index.len(),
                    bundle.calibration().bias,
                    bundle.calibration().std_dev
                );
                contexts.insert(id, ModelContext { index, margins });
            }
            let context = &contexts[id];

            slate.push(classify_game(game, &context.index, &context.margins)?);
        }

        select_superdog(&mut slate.superdogs);

        info!(
            "Classified {} games: {} straight-up, {} noisy-spread, {} superdog",
            slate.len(),
            slate.straight_up.len(),
            slate.noisy_spread.len(),
            slate.superdogs.len()
        );

        Ok(slate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PickError;
    use crate::models::{
        CanonicalPrediction, ModelBundle, ModelCalibration, ModelPerformance, PredictionId, TeamId,
    };
    use std::sync::Arc;

    fn prediction(id: &str, home: &str, road: &str, spread: f64) -> CanonicalPrediction {
        CanonicalPrediction {
            id: PredictionId::from(id),
            home: TeamId::from(home),
            road: TeamId::from(road),
            neutral_site: false,
            spread,
        }
    }

    fn bundle(id: &str, std_dev: f64, predictions: Vec<CanonicalPrediction>) -> ModelBundle {
        ModelBundle {
            performance: ModelPerformance {
                model: ModelId::from(id),
                calibration: ModelCalibration { bias: 0.0, std_dev },
                straight_up_win_rate: 0.7,
                mean_absolute_error: 11.0,
            },
            predictions,
        }
    }

    fn week_predictions() -> Vec<CanonicalPrediction> {
        vec![
            prediction("g1", "michigan", "ohio-state", 7.0),
            prediction("g2", "oregon", "washington", -2.5),
            prediction("g3", "alabama", "vanderbilt", 24.0),
            prediction("g4", "kansas", "texas", -10.0),
            prediction("g5", "georgia", "florida", 0.0),
        ]
    }

    #[test]
    fn test_run_classifies_every_game() {
        let models = CategoryModels::uniform(bundle("line", 10.0, week_predictions()));
        let games = vec![
            DeclaredGame::straight_up(1, "michigan", "ohio-state"),
            DeclaredGame::noisy_spread(2, "oregon", "washington", -3),
            DeclaredGame::straight_up(3, "florida", "georgia"),
            DeclaredGame::superdog(20, "vanderbilt", "alabama", 20),
            DeclaredGame::superdog(21, "kansas", "texas", 10),
        ];

        let slate = PickEngine::new(&models).run(&games).unwrap();
        assert_eq!(slate.straight_up.len(), 2);
        assert_eq!(slate.noisy_spread.len(), 1);
        assert_eq!(slate.superdogs.len(), 2);

        let michigan = &slate.straight_up[0];
        assert_eq!(michigan.pick, TeamId::from("michigan"));
        assert!((michigan.predicted_probability - 0.758).abs() < 1e-3);

        // Swapped even game still goes to the canonical home team
        let even = &slate.straight_up[1];
        assert!(even.swap);
        assert_eq!(even.pick, TeamId::from("georgia"));
        assert_eq!(even.predicted_probability, 0.5);

        // Kansas at -10 is a much better long shot than Vanderbilt at -24
        let selected: Vec<_> = slate.superdogs.iter().filter(|s| s.is_selected()).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].underdog, TeamId::from("kansas"));
    }

    #[test]
    fn test_run_superdog_tie_keeps_first_row() {
        let mut predictions = week_predictions();
        predictions.push(prediction("g6", "iowa", "nebraska", -10.0));
        let models = CategoryModels::uniform(bundle("line", 10.0, predictions));
        let games = vec![
            DeclaredGame::straight_up(1, "michigan", "ohio-state"),
            DeclaredGame::superdog(20, "iowa", "nebraska", 10),
            DeclaredGame::superdog(21, "kansas", "texas", 10),
        ];

        let slate = PickEngine::new(&models).run(&games).unwrap();
        let [first, second] = slate.superdogs.as_slice() else {
            panic!("expected two superdog candidates");
        };
        assert_eq!(first.expected_value(), second.expected_value());
        assert!(first.is_selected());
        assert_eq!(first.pick, Some(TeamId::from("iowa")));
        assert!(!second.is_selected());
    }

    #[test]
    fn test_run_uses_model_per_category() {
        let straight = Arc::new(bundle("sagarin", 10.0, week_predictions()));
        let noisy = Arc::new(bundle(
            "massey",
            10.0,
            vec![prediction("m2", "oregon", "washington", 6.0)],
        ));
        let models = CategoryModels {
            straight_up: straight,
            noisy_spread: noisy.clone(),
            superdog: noisy,
        };
        let games = vec![
            DeclaredGame::straight_up(1, "michigan", "ohio-state"),
            DeclaredGame::noisy_spread(2, "oregon", "washington", 3),
        ];

        let slate = PickEngine::new(&models).run(&games).unwrap();
        assert_eq!(slate.straight_up[0].model, ModelId::from("sagarin"));
        assert_eq!(slate.noisy_spread[0].model, ModelId::from("massey"));
        assert_eq!(slate.noisy_spread[0].modeled_game, PredictionId::from("m2"));
        assert_eq!(slate.noisy_spread[0].pick, TeamId::from("oregon"));
    }

    #[test]
    fn test_run_fails_whole_slate_on_unknown_team() {
        let models = CategoryModels::uniform(bundle("line", 10.0, week_predictions()));
        let games = vec![
            DeclaredGame::straight_up(1, "michigan", "ohio-state"),
            DeclaredGame::straight_up(2, "army", "navy"),
        ];

        let err = PickEngine::new(&models).run(&games).unwrap_err();
        assert!(matches!(err, PickError::TeamNotFound { .. }));
    }

    #[test]
    fn test_run_rejects_bad_calibration() {
        let models = CategoryModels::uniform(bundle("line", 0.0, week_predictions()));
        let games = vec![DeclaredGame::straight_up(1, "michigan", "ohio-state")];

        let err = PickEngine::new(&models).run(&games).unwrap_err();
        assert!(matches!(err, PickError::InvalidCalibration { .. }));
    }

    #[test]
    fn test_run_empty_slate() {
        let models = CategoryModels::uniform(bundle("line", 10.0, week_predictions()));
        let slate = PickEngine::new(&models).run(&[]).unwrap();
        assert!(slate.is_empty());
    }
}
