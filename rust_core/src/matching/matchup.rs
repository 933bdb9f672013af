//! Matchup Resolver
//!
//! Matches a declared team pair to one of a model's canonical predictions.
//! The slate and the model do not agree on which team is "home", so the
//! resolver reports the orientation as a first-class value instead of
//! flipping signs for its callers.

use crate::error::{IndexSide, PickError, PickResult};
use crate::models::{CanonicalPrediction, ModelBundle, ModelId, Orientation, TeamId};
use rustc_hash::FxHashMap;

/// A declared pair matched to a canonical prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedMatchup<'a> {
    pub prediction: &'a CanonicalPrediction,
    pub orientation: Orientation,
}

impl ResolvedMatchup<'_> {
    pub fn is_swapped(&self) -> bool {
        self.orientation.is_swapped()
    }
}

/// Home- and road-team lookup tables over one model's prediction set.
///
/// Built once per model per invocation; never shared across invocations
/// because prediction sets change between slates.
#[derive(Debug)]
pub struct MatchupIndex<'a> {
    model: &'a ModelId,
    predictions: &'a [CanonicalPrediction],
    by_home: FxHashMap<&'a TeamId, usize>,
    by_road: FxHashMap<&'a TeamId, usize>,
}

impl<'a> MatchupIndex<'a> {
    pub fn new(bundle: &'a ModelBundle) -> Self {
        Self::from_predictions(bundle.id(), &bundle.predictions)
    }

    pub fn from_predictions(model: &'a ModelId, predictions: &'a [CanonicalPrediction]) -> Self {
        let mut by_home = FxHashMap::default();
        let mut by_road = FxHashMap::default();
        by_home.reserve(predictions.len());
        by_road.reserve(predictions.len());

        for (i, prediction) in predictions.iter().enumerate() {
            by_home.insert(&prediction.home, i);
            by_road.insert(&prediction.road, i);
        }

        Self {
            model,
            predictions,
            by_home,
            by_road,
        }
    }

    pub fn model(&self) -> &ModelId {
        self.model
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Resolve a declared (home, road) pair.
    ///
    /// The declared home team is looked up in the home index first; if it is
    /// only found in the road index the pair is treated as swapped and the
    /// declared road team must then appear in the home index. Both lookups
    /// must land on the same prediction.
    pub fn resolve(&self, home: &TeamId, road: &TeamId) -> PickResult<ResolvedMatchup<'a>> {
        let (home_idx, orientation) = match self.by_home.get(home) {
            Some(&i) => (i, Orientation::Aligned),
            None => match self.by_road.get(home) {
                Some(&i) => (i, Orientation::Swapped),
                None => return Err(self.not_found(home, IndexSide::Either)),
            },
        };

        let (opposite, side) = match orientation {
            Orientation::Aligned => (&self.by_road, IndexSide::Road),
            Orientation::Swapped => (&self.by_home, IndexSide::Home),
        };
        let road_idx = *opposite
            .get(road)
            .ok_or_else(|| self.not_found(road, side))?;

        if home_idx != road_idx {
            return Err(PickError::MismatchedMatchup {
                home: home.clone(),
                road: road.clone(),
                home_prediction: self.predictions[home_idx].id.clone(),
                road_prediction: self.predictions[road_idx].id.clone(),
                model: self.model.clone(),
            });
        }

        Ok(ResolvedMatchup {
            prediction: &self.predictions[home_idx],
            orientation,
        })
    }

    fn not_found(&self, team: &TeamId, searched: IndexSide) -> PickError {
        PickError::TeamNotFound {
            team: team.clone(),
            searched,
            model: self.model.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PredictionId;

    fn prediction(id: &str, home: &str, road: &str, spread: f64) -> CanonicalPrediction {
        CanonicalPrediction {
            id: PredictionId::from(id),
            home: TeamId::from(home),
            road: TeamId::from(road),
            neutral_site: false,
            spread,
        }
    }

    fn predictions() -> Vec<CanonicalPrediction> {
        vec![
            prediction("g1", "michigan", "ohio-state", 3.5),
            prediction("g2", "iowa", "minnesota", -1.0),
            prediction("g3", "wisconsin", "purdue", 10.0),
        ]
    }

    #[test]
    fn test_resolve_aligned() {
        let model = ModelId::from("line");
        let preds = predictions();
        let index = MatchupIndex::from_predictions(&model, &preds);

        let resolved = index
            .resolve(&TeamId::from("iowa"), &TeamId::from("minnesota"))
            .unwrap();
        assert_eq!(resolved.prediction.id, PredictionId::from("g2"));
        assert_eq!(resolved.orientation, Orientation::Aligned);
        assert!(!resolved.is_swapped());
    }

    #[test]
    fn test_resolve_swapped() {
        let model = ModelId::from("line");
        let preds = predictions();
        let index = MatchupIndex::from_predictions(&model, &preds);

        let resolved = index
            .resolve(&TeamId::from("ohio-state"), &TeamId::from("michigan"))
            .unwrap();
        assert_eq!(resolved.prediction.id, PredictionId::from("g1"));
        assert_eq!(resolved.orientation, Orientation::Swapped);
    }

    #[test]
    fn test_unknown_home_team() {
        let model = ModelId::from("line");
        let preds = predictions();
        let index = MatchupIndex::from_predictions(&model, &preds);

        let err = index
            .resolve(&TeamId::from("rutgers"), &TeamId::from("purdue"))
            .unwrap_err();
        assert_eq!(
            err,
            PickError::TeamNotFound {
                team: TeamId::from("rutgers"),
                searched: IndexSide::Either,
                model: ModelId::from("line"),
            }
        );
    }

    #[test]
    fn test_road_team_must_be_in_opposite_index() {
        let model = ModelId::from("line");
        let preds = predictions();
        let index = MatchupIndex::from_predictions(&model, &preds);

        // Both declared teams are canonical home teams
        let err = index
            .resolve(&TeamId::from("michigan"), &TeamId::from("iowa"))
            .unwrap_err();
        assert!(matches!(
            err,
            PickError::TeamNotFound {
                searched: IndexSide::Road,
                ..
            }
        ));

        // Swapped, and the declared road team is a canonical road team too
        let err = index
            .resolve(&TeamId::from("minnesota"), &TeamId::from("purdue"))
            .unwrap_err();
        assert!(matches!(
            err,
            PickError::TeamNotFound {
                searched: IndexSide::Home,
                ..
            }
        ));
    }

    #[test]
    fn test_teams_from_different_games() {
        let model = ModelId::from("line");
        let preds = predictions();
        let index = MatchupIndex::from_predictions(&model, &preds);

        let err = index
            .resolve(&TeamId::from("michigan"), &TeamId::from("purdue"))
            .unwrap_err();
        assert_eq!(
            err,
            PickError::MismatchedMatchup {
                home: TeamId::from("michigan"),
                road: TeamId::from("purdue"),
                home_prediction: PredictionId::from("g1"),
                road_prediction: PredictionId::from("g3"),
                model: ModelId::from("line"),
            }
        );
    }

    #[test]
    fn test_every_prediction_resolves_both_ways() {
        let model = ModelId::from("line");
        let preds = predictions();
        let index = MatchupIndex::from_predictions(&model, &preds);
        assert_eq!(index.len(), 3);

        for p in &preds {
            let aligned = index.resolve(&p.home, &p.road).unwrap();
            let swapped = index.resolve(&p.road, &p.home).unwrap();
            assert_eq!(aligned.prediction.id, p.id);
            assert_eq!(swapped.prediction.id, p.id);
            assert_eq!(aligned.orientation, Orientation::Aligned);
            assert_eq!(swapped.orientation, Orientation::Swapped);
        }
    }
}
