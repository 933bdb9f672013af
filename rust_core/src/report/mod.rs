//! Slate Report
//!
//! Lays the pick aggregate out the way the slate spreadsheet expects it: one
//! line per slate row, six columns, with the streak pick dropped in between
//! the regular picks and the superdogs.

use crate::models::{
    NoisySpreadPick, PickAggregate, StraightUpPick, StreakPick, SuperdogPick, Team, TeamId,
};
use crate::sources::TeamDirectory;
use std::borrow::Cow;
use tracing::warn;

pub const HEADER: [&str; 6] = [
    "GAME",
    "Instruction",
    "Your Selection",
    "Predicted Spread",
    "Notes",
    "Expected Value",
];

/// Probability above which a pick is called a lock.
const LOCK_PROBABILITY: f64 = 0.8;
/// Spread separating comfortable games from close ones.
const BLOWOUT_MARGIN: f64 = 14.0;

const NOTE_LOCK: &str = "Not even close.";
const NOTE_SHOULD_BE_NOISY: &str = "Probably should have been noisy.";
const NOTE_CLOSER: &str = "This one will be closer than you think.";
const NOTE_IS_NEUTRAL: &str = "NOTE: This game is at a neutral site.";
const NOTE_NOT_NEUTRAL: &str = "NOTE: This game isn't at a neutral site.";
const NOTE_SWAPPED: &str = "NOTE: The home and away teams are reversed from their actual values.";
const NOTE_UNDERDOG_FAVORED: &str = "NOTE: The \"underdog\" is favored to win!";

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    /// Slate row; the header occupies row 0.
    pub row: u32,
    pub cells: [String; 6],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlateReport {
    /// Sorted by slate row.
    pub rows: Vec<ReportRow>,
}

impl SlateReport {
    pub fn row(&self, row: u32) -> Option<&ReportRow> {
        self.rows.iter().find(|r| r.row == row)
    }

    /// Tab-separated text with blank lines for unused slate rows.
    pub fn to_tsv(&self) -> String {
        let mut out = HEADER.join("\t");
        out.push('\n');

        let mut next = 1;
        for row in &self.rows {
            while next < row.row {
                out.push_str(&"\t".repeat(HEADER.len() - 1));
                out.push('\n');
                next += 1;
            }
            let cells: Vec<String> = row.cells.iter().map(|c| sanitize(c)).collect();
            out.push_str(&cells.join("\t"));
            out.push('\n');
            next = row.row.max(next) + 1;
        }
        out
    }
}

fn sanitize(cell: &str) -> String {
    cell.replace(['\t', '\n'], " ")
}

/// Every team id the report needs a display name for.
pub fn team_ids(aggregate: &PickAggregate) -> Vec<TeamId> {
    let mut ids: Vec<TeamId> = Vec::new();
    let mut add = |id: &TeamId| {
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    };

    for pick in &aggregate.straight_up {
        add(&pick.road);
        add(&pick.home);
    }
    for pick in &aggregate.noisy_spread {
        add(&pick.road);
        add(&pick.home);
    }
    for pick in &aggregate.superdogs {
        add(&pick.underdog);
        add(&pick.overdog);
    }
    if let Some(streak) = &aggregate.streak {
        streak.picks.iter().for_each(&mut add);
    }
    ids
}

pub fn build_report(aggregate: &PickAggregate, teams: &TeamDirectory) -> SlateReport {
    let names = Names { teams };
    let mut rows = Vec::with_capacity(aggregate.pick_count());

    rows.extend(aggregate.straight_up.iter().map(|p| straight_up_row(p, &names)));
    rows.extend(aggregate.noisy_spread.iter().map(|p| noisy_spread_row(p, &names)));

    if let Some(streak) = &aggregate.streak {
        let row = streak_row_position(aggregate);
        rows.push(streak_row(streak, row, &names));
    }

    rows.extend(aggregate.superdogs.iter().map(|p| superdog_row(p, &names)));

    rows.sort_by_key(|r| r.row);
    SlateReport { rows }
}

/// Slate row the streak pick is rendered on.
///
/// Halfway between the last regular pick and the first superdog, rounded
/// up; one past everything else when either kind is missing. A slot already
/// taken by a pick also falls back to one past everything else, so declared
/// rows never move.
pub fn streak_row_position(aggregate: &PickAggregate) -> u32 {
    let pick_rows = || {
        aggregate
            .straight_up
            .iter()
            .map(|p| p.row)
            .chain(aggregate.noisy_spread.iter().map(|p| p.row))
    };
    let dog_rows = || aggregate.superdogs.iter().map(|p| p.row);
    let past_end = pick_rows().chain(dog_rows()).max().map_or(1, |max| max + 1);

    match (pick_rows().max(), dog_rows().min()) {
        (Some(last), Some(first)) => {
            let last_f = f64::from(last);
            let midpoint = (last_f + (f64::from(first) - last_f) / 2.0).ceil() as u32;
            if pick_rows().chain(dog_rows()).any(|row| row == midpoint) {
                past_end
            } else {
                midpoint
            }
        }
        _ => past_end,
    }
}

struct Names<'a> {
    teams: &'a TeamDirectory,
}

impl Names<'_> {
    fn team(&self, id: &TeamId) -> Cow<'_, Team> {
        match self.teams.get(id) {
            Some(team) => Cow::Borrowed(team),
            None => {
                warn!("No display name for team {}; using its id", id);
                Cow::Owned(Team {
                    id: id.clone(),
                    school: id.to_string(),
                    name: id.to_string(),
                })
            }
        }
    }

    /// Nickname, unless both teams share it.
    fn selection(&self, picked: &Team, other: &Team) -> String {
        if picked.name == other.name {
            picked.school.clone()
        } else {
            picked.name.clone()
        }
    }
}

fn matchup_label(
    road: &Team,
    home: &Team,
    rank1: Option<u32>,
    rank2: Option<u32>,
    neutral_site: bool,
    gotw: bool,
) -> String {
    let mut label = String::new();
    if gotw {
        label.push('⭐');
    }
    if let Some(rank) = rank1 {
        label.push_str(&format!("#{rank} "));
    }
    label.push_str(&road.school);
    label.push_str(if neutral_site { " vs. " } else { " @ " });
    if let Some(rank) = rank2 {
        label.push_str(&format!("#{rank} "));
    }
    label.push_str(&home.school);
    if gotw {
        label.push('⭐');
    }
    label
}

fn site_note(neutral_disagreement: bool, neutral_site: bool, swap: bool) -> Option<&'static str> {
    if neutral_disagreement {
        Some(if neutral_site {
            NOTE_IS_NEUTRAL
        } else {
            NOTE_NOT_NEUTRAL
        })
    } else if swap {
        Some(NOTE_SWAPPED)
    } else {
        None
    }
}

fn straight_up_row(pick: &StraightUpPick, names: &Names<'_>) -> ReportRow {
    let home = names.team(&pick.home);
    let road = names.team(&pick.road);
    let (picked, other) = if pick.pick == pick.road {
        (&road, &home)
    } else {
        (&home, &road)
    };

    let mut notes = Vec::new();
    if pick.predicted_probability > LOCK_PROBABILITY {
        notes.push(NOTE_LOCK);
    }
    if pick.predicted_spread.abs() >= BLOWOUT_MARGIN {
        notes.push(NOTE_SHOULD_BE_NOISY);
    }
    notes.extend(site_note(
        pick.neutral_disagreement,
        pick.neutral_site,
        pick.swap,
    ));

    let weight = if pick.gotw { 2.0 } else { 1.0 };

    ReportRow {
        row: pick.row,
        cells: [
            matchup_label(
                &road,
                &home,
                pick.rank1,
                pick.rank2,
                pick.neutral_site,
                pick.gotw,
            ),
            String::new(),
            names.selection(picked, other),
            format!("{:.1}", pick.predicted_spread),
            notes.join(" "),
            format!("{:.3}", weight * pick.predicted_probability),
        ],
    }
}

fn noisy_spread_row(pick: &NoisySpreadPick, names: &Names<'_>) -> ReportRow {
    let home = names.team(&pick.home);
    let road = names.team(&pick.road);
    let (picked, other) = if pick.pick == pick.road {
        (&road, &home)
    } else {
        (&home, &road)
    };

    let threshold = pick.canonical_noisy_spread();
    let favorite = if threshold < 0 { &road } else { &home };

    let mut notes = Vec::new();
    if pick.predicted_probability > LOCK_PROBABILITY {
        notes.push(NOTE_LOCK);
    }
    if pick.predicted_spread.abs() < BLOWOUT_MARGIN {
        notes.push(NOTE_CLOSER);
    }
    notes.extend(site_note(
        pick.neutral_disagreement,
        pick.neutral_site,
        pick.swap,
    ));

    ReportRow {
        row: pick.row,
        cells: [
            matchup_label(&road, &home, pick.rank1, pick.rank2, pick.neutral_site, false),
            format!("{} by ≥ {}", favorite.school, threshold.unsigned_abs()),
            names.selection(picked, other),
            format!("{:.1}", pick.predicted_spread),
            notes.join(" "),
            format!("{:.3}", pick.predicted_probability),
        ],
    }
}

fn superdog_row(pick: &SuperdogPick, names: &Names<'_>) -> ReportRow {
    let underdog = names.team(&pick.underdog);
    let overdog = names.team(&pick.overdog);

    let selection = if pick.is_selected() {
        names.selection(&underdog, &overdog)
    } else {
        String::new()
    };
    let notes = if pick.predicted_probability > 0.5 {
        NOTE_UNDERDOG_FAVORED.to_string()
    } else {
        String::new()
    };

    ReportRow {
        row: pick.row,
        cells: [
            format!("{} over {}", underdog.school, overdog.school),
            format!("({} points)", pick.value),
            selection,
            format!("{:.1}", pick.predicted_spread),
            notes,
            format!("{:.4}", pick.expected_value()),
        ],
    }
}

fn streak_row(streak: &StreakPick, row: u32, names: &Names<'_>) -> ReportRow {
    let teams: Vec<Cow<'_, Team>> = streak.picks.iter().map(|id| names.team(id)).collect();

    let mut seen: Vec<&str> = Vec::new();
    let shared_nickname = teams.iter().any(|t| {
        let duplicate = seen.contains(&t.name.as_str());
        seen.push(&t.name);
        duplicate
    });
    let selection: Vec<&str> = teams
        .iter()
        .map(|t| {
            if shared_nickname {
                t.school.as_str()
            } else {
                t.name.as_str()
            }
        })
        .collect();

    ReportRow {
        row,
        cells: [
            String::new(),
            "BEAT THE STREAK!".to_string(),
            selection.join(" + "),
            format!("{:.1}", streak.predicted_spread),
            String::new(),
            format!("{:.4}", streak.predicted_probability),
        ],
    }
}
