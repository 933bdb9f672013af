//! In-memory collaborators.
//!
//! Used by tests and by dry runs against fixture data. Commits are recorded
//! whole so callers can assert that an aggregate was (or was not) persisted.

use super::{
    ModelSource, PersistenceSink, PickerSource, RenderingSink, SlateSource, StreakSource,
    TeamDirectory, TeamSource,
};
use crate::models::{
    DeclaredGame, ModelBundle, ModelId, PickAggregate, Picker, PickerId, RankingMetric, SeasonId,
    Slate, SlateId, StreakPick, Team, TeamId,
};
use crate::report::SlateReport;
use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    slates: HashMap<SlateId, (Slate, Vec<DeclaredGame>)>,
    models: Vec<ModelBundle>,
    pickers: Vec<Picker>,
    streaks: HashMap<(PickerId, SeasonId, u32), StreakPick>,
    teams: TeamDirectory,
    fail_commits: bool,
    committed: Mutex<Vec<PickAggregate>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slate(mut self, slate: Slate, mut games: Vec<DeclaredGame>) -> Self {
        games.sort_by_key(|g| g.row);
        self.slates.insert(slate.id.clone(), (slate, games));
        self
    }

    pub fn with_model(mut self, model: ModelBundle) -> Self {
        self.models.push(model);
        self
    }

    pub fn with_picker(mut self, picker: Picker) -> Self {
        self.pickers.push(picker);
        self
    }

    /// Seeds the streak pick for the slate of `slate_week`.
    pub fn with_streak(
        mut self,
        picker: PickerId,
        season: SeasonId,
        slate_week: u32,
        streak: StreakPick,
    ) -> Self {
        self.streaks.insert((picker, season, slate_week), streak);
        self
    }

    pub fn with_team(mut self, team: Team) -> Self {
        self.teams.insert(team.id.clone(), team);
        self
    }

    /// Make every commit fail, for exercising the no-partial-write path.
    pub fn with_failing_commits(mut self) -> Self {
        self.fail_commits = true;
        self
    }

    pub fn committed(&self) -> Vec<PickAggregate> {
        self.committed.lock().clone()
    }
}

#[async_trait]
impl SlateSource for InMemoryStore {
    async fn slate(&self, id: &SlateId) -> Result<Option<Slate>> {
        Ok(self.slates.get(id).map(|(slate, _)| slate.clone()))
    }

    async fn games(&self, id: &SlateId) -> Result<Vec<DeclaredGame>> {
        Ok(self
            .slates
            .get(id)
            .map(|(_, games)| games.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl ModelSource for InMemoryStore {
    async fn model(&self, id: &ModelId) -> Result<Option<ModelBundle>> {
        Ok(self.models.iter().find(|m| m.id() == id).cloned())
    }

    async fn best_model(&self, metric: RankingMetric) -> Result<Option<ModelBundle>> {
        // First-inserted model wins ties
        let best = self.models.iter().fold(None::<&ModelBundle>, |best, m| {
            let better = match best {
                None => true,
                Some(b) => match metric {
                    RankingMetric::StraightUpWins => {
                        m.performance.straight_up_win_rate > b.performance.straight_up_win_rate
                    }
                    RankingMetric::MeanAbsoluteError => {
                        m.performance.mean_absolute_error < b.performance.mean_absolute_error
                    }
                },
            };
            if better {
                Some(m)
            } else {
                best
            }
        });
        Ok(best.cloned())
    }
}

#[async_trait]
impl PickerSource for InMemoryStore {
    async fn picker_by_name(&self, name: &str) -> Result<Option<Picker>> {
        Ok(self.pickers.iter().find(|p| p.name == name).cloned())
    }
}

#[async_trait]
impl StreakSource for InMemoryStore {
    async fn streak_pick(
        &self,
        picker: &PickerId,
        season: &SeasonId,
        week: u32,
    ) -> Result<Option<StreakPick>> {
        Ok(self
            .streaks
            .get(&(picker.clone(), season.clone(), week))
            .cloned())
    }
}

#[async_trait]
impl TeamSource for InMemoryStore {
    async fn teams(&self, ids: &[TeamId]) -> Result<TeamDirectory> {
        Ok(ids
            .iter()
            .filter_map(|id| self.teams.get(id).map(|t| (id.clone(), t.clone())))
            .collect())
    }
}

#[async_trait]
impl PersistenceSink for InMemoryStore {
    async fn commit(&self, aggregate: &PickAggregate) -> Result<()> {
        if self.fail_commits {
            bail!("commit of pick set {} rejected", aggregate.id);
        }
        self.committed.lock().push(aggregate.clone());
        Ok(())
    }
}

/// Captures rendered reports instead of writing files.
#[derive(Debug, Default)]
pub struct InMemoryReportSink {
    rendered: Mutex<Vec<(Slate, SlateReport)>>,
}

impl InMemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rendered(&self) -> Vec<(Slate, SlateReport)> {
        self.rendered.lock().clone()
    }
}

#[async_trait]
impl RenderingSink for InMemoryReportSink {
    async fn render(&self, slate: &Slate, report: &SlateReport) -> Result<()> {
        self.rendered.lock().push((slate.clone(), report.clone()));
        Ok(())
    }
}
