//! Pick records and the per-picker aggregate handed to storage and rendering.

use super::{ModelId, PickCategory, PickerId, PredictionId, SeasonId, SlateId, TeamId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pick on a game decided outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StraightUpPick {
    /// True home team per the model, not necessarily what the slate said.
    pub home: TeamId,
    /// True road team per the model.
    pub road: TeamId,
    pub rank1: Option<u32>,
    pub rank2: Option<u32>,
    pub gotw: bool,
    /// True neutral-site status per the model.
    pub neutral_site: bool,
    /// Whether the slate's neutral-site claim disagrees with the model.
    pub neutral_disagreement: bool,
    /// Whether the slate reversed home and road.
    pub swap: bool,
    pub pick: TeamId,
    /// Model margin, positive favoring `home`.
    pub predicted_spread: f64,
    /// Probability that `pick` is correct.
    pub predicted_probability: f64,
    pub modeled_game: PredictionId,
    pub model: ModelId,
    pub row: u32,
}

/// Pick on a game that must be won by a declared margin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoisySpreadPick {
    pub home: TeamId,
    pub road: TeamId,
    pub rank1: Option<u32>,
    pub rank2: Option<u32>,
    /// Threshold exactly as the slate declared it (positive favors the
    /// slate's home team, which is `road` when `swap` is set).
    pub noisy_spread: i32,
    pub neutral_site: bool,
    pub neutral_disagreement: bool,
    pub swap: bool,
    pub pick: TeamId,
    pub predicted_spread: f64,
    /// Probability that `pick` covers the threshold.
    pub predicted_probability: f64,
    pub modeled_game: PredictionId,
    pub model: ModelId,
    pub row: u32,
}

impl NoisySpreadPick {
    /// Threshold relative to the true home team.
    pub fn canonical_noisy_spread(&self) -> i32 {
        if self.swap {
            -self.noisy_spread
        } else {
            self.noisy_spread
        }
    }
}

/// Long-shot candidate. Only one per slate ends up with `pick` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperdogPick {
    /// What the slate called the underdog, regardless of the model.
    pub underdog: TeamId,
    pub overdog: TeamId,
    pub rank1: Option<u32>,
    pub rank2: Option<u32>,
    pub value: u32,
    pub neutral_site: bool,
    pub neutral_disagreement: bool,
    /// Whether the underdog is the model's road team.
    pub swap: bool,
    /// `Some(underdog)` for the selected candidate, `None` otherwise.
    pub pick: Option<TeamId>,
    /// Model margin oriented to the underdog.
    pub predicted_spread: f64,
    /// Probability the underdog wins outright.
    pub predicted_probability: f64,
    pub modeled_game: PredictionId,
    pub model: ModelId,
    pub row: u32,
}

impl SuperdogPick {
    pub fn expected_value(&self) -> f64 {
        self.predicted_probability * self.value as f64
    }

    pub fn is_selected(&self) -> bool {
        self.pick.is_some()
    }
}

/// Externally computed streak recommendation, folded in unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakPick {
    /// Teams picked this week; a streak week may carry more than one.
    pub picks: Vec<TeamId>,
    pub predicted_spread: f64,
    pub predicted_probability: f64,
}

/// One pick record of any category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ClassifiedPick {
    StraightUp(StraightUpPick),
    NoisySpread(NoisySpreadPick),
    Superdog(SuperdogPick),
}

impl ClassifiedPick {
    pub fn category(&self) -> PickCategory {
        match self {
            ClassifiedPick::StraightUp(_) => PickCategory::StraightUp,
            ClassifiedPick::NoisySpread(_) => PickCategory::NoisySpread,
            ClassifiedPick::Superdog(_) => PickCategory::Superdog,
        }
    }

    pub fn row(&self) -> u32 {
        match self {
            ClassifiedPick::StraightUp(p) => p.row,
            ClassifiedPick::NoisySpread(p) => p.row,
            ClassifiedPick::Superdog(p) => p.row,
        }
    }
}

/// Every pick for one picker and one slate, written and rendered together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickAggregate {
    pub id: Uuid,
    pub picker: PickerId,
    pub slate: SlateId,
    pub season: SeasonId,
    pub week: u32,
    pub created_at: DateTime<Utc>,
    pub straight_up: Vec<StraightUpPick>,
    pub noisy_spread: Vec<NoisySpreadPick>,
    pub superdogs: Vec<SuperdogPick>,
    pub streak: Option<StreakPick>,
}

impl PickAggregate {
    pub fn selected_superdog(&self) -> Option<&SuperdogPick> {
        self.superdogs.iter().find(|p| p.is_selected())
    }

    pub fn pick_count(&self) -> usize {
        self.straight_up.len()
            + self.noisy_spread.len()
            + self.superdogs.len()
            + usize::from(self.streak.is_some())
    }
}
