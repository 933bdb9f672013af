//! Pickem Core - Prediction resolution and pick decision engine.
//!
//! This crate provides:
//! - Matchup resolution between slate rows and a model's canonical predictions
//! - Calibrated win/cover probabilities from a model's Normal error distribution
//! - Straight-up, noisy-spread and superdog pick classification
//! - Expected-value superdog selection
//! - Per-category model selection (explicit or best-ranked)
//! - Collaborator traits with in-memory and PostgreSQL implementations
//! - Slate report rendering
//! - The end-to-end `generate_picks` pipeline

pub mod db;
pub mod error;
pub mod matching;
pub mod models;
pub mod picks;
pub mod pipeline;
pub mod probability;
pub mod report;
pub mod selection;
pub mod sources;

pub use error::{IndexSide, PickError, PickResult};
pub use matching::{MatchupIndex, ResolvedMatchup};
pub use models::*;
pub use picks::{ClassifiedSlate, PickEngine};
pub use pipeline::{generate_picks, GeneratePicksRequest};
pub use probability::MarginModel;
pub use report::{build_report, ReportRow, SlateReport};
pub use selection::{
    resolve_models, CategoryModels, ModelChoice, ModelRequest, SelectionPlan, SuperdogFallback,
};
pub use sources::{
    Collaborators, InMemoryReportSink, InMemoryStore, ModelSource, PersistenceSink, PickerSource,
    RenderingSink, SlateSource, StreakSource, TeamDirectory, TeamSource,
};
