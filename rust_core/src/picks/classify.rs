//! Pick Classifier
//!
//! Turns one declared game plus its resolved prediction into exactly one pick
//! record. Winner selection for straight-up and noisy-spread games picks the
//! canonical home team when its probability is at least 0.5, so an exact
//! 0.5 always goes to the home team.

use crate::error::PickResult;
use crate::matching::{MatchupIndex, ResolvedMatchup};
use crate::models::{
    ClassifiedPick, DeclaredGame, DeclaredMatchup, NoisySpreadPick, StraightUpPick, SuperdogPick,
    TeamId,
};
use crate::probability::{threshold_margin, underdog_margin, MarginModel};
use tracing::debug;

/// Neutral-site flags for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeutralSite {
    /// Declared and canonical neutral-site flags differ.
    pub disagreement: bool,
    /// Declared flag corrected by the disagreement, i.e. the canonical value.
    pub neutral_site: bool,
}

impl NeutralSite {
    pub fn new(declared: bool, canonical: bool) -> Self {
        let disagreement = declared ^ canonical;
        Self {
            disagreement,
            neutral_site: declared ^ disagreement,
        }
    }
}

/// Probability of the selected side plus which side that is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub home_selected: bool,
    pub probability: f64,
}

impl Selection {
    /// Home on `home_probability >= 0.5`, road otherwise.
    pub fn from_home_probability(home_probability: f64) -> Self {
        if home_probability >= 0.5 {
            Self {
                home_selected: true,
                probability: home_probability,
            }
        } else {
            Self {
                home_selected: false,
                probability: 1.0 - home_probability,
            }
        }
    }
}

/// Classify one game. Superdog candidates come back unselected.
pub fn classify_game(
    game: &DeclaredGame,
    index: &MatchupIndex<'_>,
    margins: &MarginModel,
) -> PickResult<ClassifiedPick> {
    match &game.matchup {
        DeclaredMatchup::Superdog {
            underdog,
            overdog,
            value,
        } => {
            let resolved = index.resolve(underdog, overdog)?;
            Ok(ClassifiedPick::Superdog(classify_superdog(
                game, underdog, overdog, *value, resolved, index, margins,
            )))
        }
        DeclaredMatchup::Standard {
            home,
            road,
            noisy_spread,
        } => {
            let resolved = index.resolve(home, road)?;
            Ok(classify_standard(game, *noisy_spread, resolved, index, margins))
        }
    }
}

fn classify_standard(
    game: &DeclaredGame,
    noisy_spread: i32,
    resolved: ResolvedMatchup<'_>,
    index: &MatchupIndex<'_>,
    margins: &MarginModel,
) -> ClassifiedPick {
    let prediction = resolved.prediction;
    let margin = threshold_margin(prediction.spread, noisy_spread, resolved.orientation);
    let home_probability = margins.probability(margin);
    let selection = Selection::from_home_probability(home_probability);
    let site = NeutralSite::new(game.neutral_site, prediction.neutral_site);
    let (rank1, rank2) = canonical_ranks(game, resolved);

    let pick = if selection.home_selected {
        prediction.home.clone()
    } else {
        prediction.road.clone()
    };

    debug!(
        "Row {}: {} @ {} (threshold {}, swap={}) margin={:.2} p(home)={:.4} -> {}",
        game.row,
        prediction.road,
        prediction.home,
        noisy_spread,
        resolved.is_swapped(),
        margin,
        home_probability,
        pick
    );

    if noisy_spread != 0 {
        ClassifiedPick::NoisySpread(NoisySpreadPick {
            home: prediction.home.clone(),
            road: prediction.road.clone(),
            rank1,
            rank2,
            noisy_spread,
            neutral_site: site.neutral_site,
            neutral_disagreement: site.disagreement,
            swap: resolved.is_swapped(),
            pick,
            predicted_spread: prediction.spread,
            predicted_probability: selection.probability,
            modeled_game: prediction.id.clone(),
            model: index.model().clone(),
            row: game.row,
        })
    } else {
        ClassifiedPick::StraightUp(StraightUpPick {
            home: prediction.home.clone(),
            road: prediction.road.clone(),
            rank1,
            rank2,
            gotw: game.gotw,
            neutral_site: site.neutral_site,
            neutral_disagreement: site.disagreement,
            swap: resolved.is_swapped(),
            pick,
            predicted_spread: prediction.spread,
            predicted_probability: selection.probability,
            modeled_game: prediction.id.clone(),
            model: index.model().clone(),
            row: game.row,
        })
    }
}

fn classify_superdog(
    game: &DeclaredGame,
    underdog: &TeamId,
    overdog: &TeamId,
    value: u32,
    resolved: ResolvedMatchup<'_>,
    index: &MatchupIndex<'_>,
    margins: &MarginModel,
) -> SuperdogPick {
    let prediction = resolved.prediction;
    let margin = underdog_margin(prediction.spread, resolved.orientation);
    let probability = margins.probability(margin);
    let site = NeutralSite::new(game.neutral_site, prediction.neutral_site);

    debug!(
        "Row {}: {} over {} ({} points, swap={}) margin={:.2} p={:.4} ev={:.4}",
        game.row,
        underdog,
        overdog,
        value,
        resolved.is_swapped(),
        margin,
        probability,
        probability * value as f64
    );

    SuperdogPick {
        underdog: underdog.clone(),
        overdog: overdog.clone(),
        rank1: game.rank1,
        rank2: game.rank2,
        value,
        neutral_site: site.neutral_site,
        neutral_disagreement: site.disagreement,
        swap: resolved.is_swapped(),
        pick: None,
        predicted_spread: margin,
        predicted_probability: probability,
        modeled_game: prediction.id.clone(),
        model: index.model().clone(),
        row: game.row,
    }
}

/// Slate ranks are (road, home) in the slate's labeling; follow the teams
/// when the slate had them reversed.
fn canonical_ranks(game: &DeclaredGame, resolved: ResolvedMatchup<'_>) -> (Option<u32>, Option<u32>) {
    if resolved.is_swapped() {
        (game.rank2, game.rank1)
    } else {
        (game.rank1, game.rank2)
    }
}
