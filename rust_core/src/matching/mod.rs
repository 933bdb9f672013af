//! Team and matchup matching between slates and model predictions.

pub mod matchup;

pub use matchup::{MatchupIndex, ResolvedMatchup};
