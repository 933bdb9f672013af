//! Pick Aggregate Assembly
//!
//! Bundles a classified slate and the externally computed streak pick into
//! the single unit that storage commits and the report renders.

use super::ClassifiedSlate;
use crate::models::{PickAggregate, Picker, Slate, StreakPick};
use chrono::Utc;
use uuid::Uuid;

pub fn assemble_aggregate(
    picker: &Picker,
    slate: &Slate,
    classified: ClassifiedSlate,
    streak: Option<StreakPick>,
) -> PickAggregate {
    let ClassifiedSlate {
        straight_up,
        noisy_spread,
        superdogs,
    } = classified;

    PickAggregate {
        id: Uuid::new_v4(),
        picker: picker.id.clone(),
        slate: slate.id.clone(),
        season: slate.season.clone(),
        week: slate.week,
        created_at: Utc::now(),
        straight_up,
        noisy_spread,
        superdogs,
        streak,
    }
}
