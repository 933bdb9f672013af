//! Superdog Selector
//!
//! Exactly one superdog candidate per slate is marked as the pick: the one
//! with the highest expected value (probability of the upset times its point
//! value). The scan is a single left fold so the earliest row wins ties.

use crate::models::SuperdogPick;
use tracing::info;

/// Position of the largest value.
///
/// Ties keep the earliest position; NaN never wins. Negative and zero values
/// are still eligible, so a single finite value is always selected.
pub fn best_expected_value<I>(values: I) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .enumerate()
        .fold(None::<(usize, f64)>, |best, (i, ev)| {
            if ev.is_nan() {
                return best;
            }
            match best {
                Some((_, top)) if ev <= top => best,
                _ => Some((i, ev)),
            }
        })
        .map(|(i, _)| i)
}

/// Mark the best candidate as picked. Returns its position, or `None` when
/// the slate has no superdog rows.
pub fn select_superdog(candidates: &mut [SuperdogPick]) -> Option<usize> {
    for candidate in candidates.iter_mut() {
        candidate.pick = None;
    }

    let winner = best_expected_value(candidates.iter().map(SuperdogPick::expected_value))?;
    let chosen = &mut candidates[winner];
    chosen.pick = Some(chosen.underdog.clone());

    info!(
        "Superdog: {} over {} (row {}, p={:.4}, value={}, ev={:.4})",
        chosen.underdog,
        chosen.overdog,
        chosen.row,
        chosen.predicted_probability,
        chosen.value,
        chosen.expected_value()
    );

    Some(winner)
}
