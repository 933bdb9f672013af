// Shared models for the pick'em engine and its collaborators
use crate::error::{PickError, PickResult};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod pick;

pub use pick::*;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Stable team identifier shared by slates and model predictions.
    TeamId
);
string_id!(
    /// Identifier of one canonical prediction within a model.
    PredictionId
);
string_id!(
    /// Identifier of a calibrated forecasting model.
    ModelId
);
string_id!(SlateId);
string_id!(PickerId);
string_id!(SeasonId);

// ============================================================================
// Pick Categories
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickCategory {
    StraightUp,
    NoisySpread,
    Superdog,
}

impl PickCategory {
    pub const ALL: [PickCategory; 3] = [
        PickCategory::StraightUp,
        PickCategory::NoisySpread,
        PickCategory::Superdog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PickCategory::StraightUp => "straight-up",
            PickCategory::NoisySpread => "noisy-spread",
            PickCategory::Superdog => "superdog",
        }
    }
}

impl fmt::Display for PickCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ranking used when no explicit model is requested for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMetric {
    /// Highest historical straight-up win rate.
    StraightUpWins,
    /// Lowest historical mean absolute error.
    MeanAbsoluteError,
}

impl fmt::Display for RankingMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingMetric::StraightUpWins => write!(f, "best straight-up win rate"),
            RankingMetric::MeanAbsoluteError => write!(f, "lowest mean absolute error"),
        }
    }
}

/// How a declared team pair lines up with the model's canonical pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Declared first team is the canonical home team.
    Aligned,
    /// Declared first team is the canonical road team.
    Swapped,
}

impl Orientation {
    pub fn is_swapped(&self) -> bool {
        matches!(self, Orientation::Swapped)
    }

    /// Re-express a value given relative to the declared first team so it is
    /// relative to the canonical home team.
    pub fn to_canonical(&self, value: f64) -> f64 {
        match self {
            Orientation::Aligned => value,
            Orientation::Swapped => -value,
        }
    }
}

// ============================================================================
// Slates & Declared Games
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slate {
    pub id: SlateId,
    pub season: SeasonId,
    pub week: u32,
    /// Original file name of the slate, reused to name the rendered report.
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picker {
    pub id: PickerId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    /// School name, e.g. "Michigan".
    pub school: String,
    /// Nickname, e.g. "Wolverines".
    pub name: String,
}

/// The teams a slate row declares, in the slate's own labeling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclaredMatchup {
    /// A straight-up or noisy-spread game. `noisy_spread` is zero for a
    /// straight-up game; a positive value means the declared home team must
    /// win by at least that many points, negative means the road team must.
    Standard {
        home: TeamId,
        road: TeamId,
        noisy_spread: i32,
    },
    /// A long-shot game worth `value` points if the underdog wins outright.
    Superdog {
        underdog: TeamId,
        overdog: TeamId,
        value: u32,
    },
}

/// One row of a slate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredGame {
    pub row: u32,
    pub matchup: DeclaredMatchup,
    pub neutral_site: bool,
    pub gotw: bool,
    pub rank1: Option<u32>,
    pub rank2: Option<u32>,
}

impl DeclaredGame {
    pub fn straight_up(row: u32, home: impl Into<TeamId>, road: impl Into<TeamId>) -> Self {
        Self::noisy_spread(row, home, road, 0)
    }

    pub fn noisy_spread(
        row: u32,
        home: impl Into<TeamId>,
        road: impl Into<TeamId>,
        noisy_spread: i32,
    ) -> Self {
        Self {
            row,
            matchup: DeclaredMatchup::Standard {
                home: home.into(),
                road: road.into(),
                noisy_spread,
            },
            neutral_site: false,
            gotw: false,
            rank1: None,
            rank2: None,
        }
    }

    pub fn superdog(
        row: u32,
        underdog: impl Into<TeamId>,
        overdog: impl Into<TeamId>,
        value: u32,
    ) -> Self {
        Self {
            row,
            matchup: DeclaredMatchup::Superdog {
                underdog: underdog.into(),
                overdog: overdog.into(),
                value,
            },
            neutral_site: false,
            gotw: false,
            rank1: None,
            rank2: None,
        }
    }

    pub fn with_neutral_site(mut self, neutral_site: bool) -> Self {
        self.neutral_site = neutral_site;
        self
    }

    pub fn with_gotw(mut self, gotw: bool) -> Self {
        self.gotw = gotw;
        self
    }

    pub fn with_ranks(mut self, rank1: Option<u32>, rank2: Option<u32>) -> Self {
        self.rank1 = rank1;
        self.rank2 = rank2;
        self
    }

    /// Routing rule: superdog first, then a nonzero threshold, else straight-up.
    pub fn category(&self) -> PickCategory {
        match &self.matchup {
            DeclaredMatchup::Superdog { .. } => PickCategory::Superdog,
            DeclaredMatchup::Standard { noisy_spread, .. } if *noisy_spread != 0 => {
                PickCategory::NoisySpread
            }
            DeclaredMatchup::Standard { .. } => PickCategory::StraightUp,
        }
    }
}

/// Flat slate row as stored by the slate authoring tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlateGameRecord {
    pub row: u32,
    pub home: Option<TeamId>,
    pub road: Option<TeamId>,
    pub neutral_site: bool,
    pub noisy_spread: Option<i32>,
    pub gotw: Option<bool>,
    pub superdog: bool,
    pub underdog: Option<TeamId>,
    pub overdog: Option<TeamId>,
    pub value: Option<u32>,
    pub rank1: Option<u32>,
    pub rank2: Option<u32>,
}

impl TryFrom<SlateGameRecord> for DeclaredGame {
    type Error = PickError;

    fn try_from(record: SlateGameRecord) -> PickResult<Self> {
        let invalid = |reason: &str| PickError::InvalidDeclaredGame {
            row: record.row,
            reason: reason.to_string(),
        };

        let matchup = if record.superdog {
            let underdog = record
                .underdog
                .clone()
                .ok_or_else(|| invalid("superdog game without an underdog"))?;
            let overdog = record
                .overdog
                .clone()
                .ok_or_else(|| invalid("superdog game without an overdog"))?;
            DeclaredMatchup::Superdog {
                underdog,
                overdog,
                value: record
                    .value
                    .ok_or_else(|| invalid("superdog game without a payout value"))?,
            }
        } else {
            let home = record
                .home
                .clone()
                .ok_or_else(|| invalid("game without a home team"))?;
            let road = record
                .road
                .clone()
                .ok_or_else(|| invalid("game without a road team"))?;
            DeclaredMatchup::Standard {
                home,
                road,
                noisy_spread: record.noisy_spread.unwrap_or(0),
            }
        };

        Ok(Self {
            row: record.row,
            matchup,
            neutral_site: record.neutral_site,
            gotw: record.gotw.unwrap_or(false),
            rank1: record.rank1.filter(|r| *r > 0),
            rank2: record.rank2.filter(|r| *r > 0),
        })
    }
}

// ============================================================================
// Models & Predictions
// ============================================================================

/// A model's own statement of a matchup, in the model's orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPrediction {
    pub id: PredictionId,
    pub home: TeamId,
    pub road: TeamId,
    pub neutral_site: bool,
    /// Predicted scoring margin; positive favors `home`.
    pub spread: f64,
}

/// Normal error distribution of a model's predicted margins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelCalibration {
    /// Mean prediction error.
    pub bias: f64,
    /// Standard deviation of prediction error.
    pub std_dev: f64,
}

/// Calibration plus the ranking metrics used for default model selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPerformance {
    pub model: ModelId,
    pub calibration: ModelCalibration,
    /// Fraction of games picked correctly straight-up this season.
    pub straight_up_win_rate: f64,
    pub mean_absolute_error: f64,
}

/// One calibrated model with its full prediction set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub performance: ModelPerformance,
    pub predictions: Vec<CanonicalPrediction>,
}

impl ModelBundle {
    pub fn id(&self) -> &ModelId {
        &self.performance.model
    }

    pub fn calibration(&self) -> ModelCalibration {
        self.performance.calibration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_routing_is_total() {
        let su = DeclaredGame::straight_up(1, "a", "b");
        let ns = DeclaredGame::noisy_spread(2, "a", "b", -7);
        let sd = DeclaredGame::superdog(3, "a", "b", 10);

        assert_eq!(su.category(), PickCategory::StraightUp);
        assert_eq!(ns.category(), PickCategory::NoisySpread);
        assert_eq!(sd.category(), PickCategory::Superdog);
    }

    #[test]
    fn test_record_without_underdog_is_rejected() {
        let record = SlateGameRecord {
            row: 12,
            superdog: true,
            overdog: Some(TeamId::from("ohio-state")),
            value: Some(10),
            ..Default::default()
        };

        let err = DeclaredGame::try_from(record).unwrap_err();
        assert!(matches!(err, PickError::InvalidDeclaredGame { row: 12, .. }));
    }

    #[test]
    fn test_record_superdog_without_value_is_rejected() {
        let record = SlateGameRecord {
            row: 20,
            superdog: true,
            underdog: Some(TeamId::from("rutgers")),
            overdog: Some(TeamId::from("michigan")),
            ..Default::default()
        };

        let err = DeclaredGame::try_from(record).unwrap_err();
        assert!(matches!(err, PickError::InvalidDeclaredGame { row: 20, .. }));
    }

    #[test]
    fn test_record_superdog_ignores_home_road() {
        let record = SlateGameRecord {
            row: 4,
            home: Some(TeamId::from("ignored")),
            superdog: true,
            underdog: Some(TeamId::from("rutgers")),
            overdog: Some(TeamId::from("michigan")),
            value: Some(15),
            noisy_spread: Some(3),
            ..Default::default()
        };

        let game = DeclaredGame::try_from(record).unwrap();
        assert_eq!(game.category(), PickCategory::Superdog);
        assert_eq!(
            game.matchup,
            DeclaredMatchup::Superdog {
                underdog: TeamId::from("rutgers"),
                overdog: TeamId::from("michigan"),
                value: 15,
            }
        );
    }

    #[test]
    fn test_record_zero_rank_is_unranked() {
        let record = SlateGameRecord {
            row: 1,
            home: Some(TeamId::from("iowa")),
            road: Some(TeamId::from("nebraska")),
            rank1: Some(0),
            rank2: Some(17),
            ..Default::default()
        };

        let game = DeclaredGame::try_from(record).unwrap();
        assert_eq!(game.rank1, None);
        assert_eq!(game.rank2, Some(17));
        assert_eq!(game.category(), PickCategory::StraightUp);
    }
}
