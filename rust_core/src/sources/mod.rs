//! Collaborator Interfaces
//!
//! The decision engine never performs I/O. Everything it reads is fetched up
//! front through these traits and everything it produces is handed off
//! afterwards. Implementations are constructed once per process and passed
//! by reference into each invocation.

use crate::models::{
    DeclaredGame, ModelBundle, ModelId, PickAggregate, Picker, PickerId, RankingMetric, SeasonId,
    Slate, SlateId, StreakPick, Team, TeamId,
};
use crate::report::SlateReport;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

pub mod memory;

pub use memory::{InMemoryReportSink, InMemoryStore};

/// Team display names keyed by id.
pub type TeamDirectory = HashMap<TeamId, Team>;

#[async_trait]
pub trait SlateSource: Send + Sync {
    /// Slate metadata, or `None` if no such slate exists.
    async fn slate(&self, id: &SlateId) -> Result<Option<Slate>>;

    /// Declared games in ascending row order.
    async fn games(&self, id: &SlateId) -> Result<Vec<DeclaredGame>>;
}

#[async_trait]
pub trait ModelSource: Send + Sync {
    /// Calibration and prediction set for an explicit model.
    async fn model(&self, id: &ModelId) -> Result<Option<ModelBundle>>;

    /// Top-ranked model by the given metric.
    async fn best_model(&self, metric: RankingMetric) -> Result<Option<ModelBundle>>;
}

#[async_trait]
pub trait PickerSource: Send + Sync {
    /// Resolve a human-given display name to a picker.
    async fn picker_by_name(&self, name: &str) -> Result<Option<Picker>>;
}

#[async_trait]
pub trait StreakSource: Send + Sync {
    /// Streak pick to play on the slate of `week`, or `None` when nothing is
    /// available yet. Callers always pass the slate's own week; where the
    /// pick is stored is up to the implementation.
    async fn streak_pick(
        &self,
        picker: &PickerId,
        season: &SeasonId,
        week: u32,
    ) -> Result<Option<StreakPick>>;
}

#[async_trait]
pub trait TeamSource: Send + Sync {
    async fn teams(&self, ids: &[TeamId]) -> Result<TeamDirectory>;
}

#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Commit every record of the aggregate, or none of them.
    async fn commit(&self, aggregate: &PickAggregate) -> Result<()>;
}

#[async_trait]
pub trait RenderingSink: Send + Sync {
    async fn render(&self, slate: &Slate, report: &SlateReport) -> Result<()>;
}

/// Handles to every collaborator one invocation needs.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub slates: &'a dyn SlateSource,
    pub models: &'a dyn ModelSource,
    pub pickers: &'a dyn PickerSource,
    pub streaks: &'a dyn StreakSource,
    pub teams: &'a dyn TeamSource,
    pub persistence: &'a dyn PersistenceSink,
    pub rendering: &'a dyn RenderingSink,
}

impl<'a> Collaborators<'a> {
    /// Use one store for every source and the persistence sink.
    pub fn from_store<S>(store: &'a S, rendering: &'a dyn RenderingSink) -> Self
    where
        S: SlateSource + ModelSource + PickerSource + StreakSource + TeamSource + PersistenceSink,
    {
        Self {
            slates: store,
            models: store,
            pickers: store,
            streaks: store,
            teams: store,
            persistence: store,
            rendering,
        }
    }
}
