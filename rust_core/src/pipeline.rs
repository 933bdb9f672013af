//! Pick Generation Pipeline
//!
//! One invocation produces one picker's picks for one slate:
//!
//! 1. resolve the picker, the slate and its declared games
//! 2. resolve a model per category
//! 3. classify every game and select the superdog
//! 4. fold in the streak pick and assemble the aggregate
//! 5. persist the aggregate atomically (skipped on a dry run)
//! 6. render the report
//!
//! Any failure before step 5 leaves nothing persisted and nothing rendered.
//! A failed persist aborts before rendering.

use crate::error::PickError;
use crate::models::{PickAggregate, SlateId};
use crate::picks::{assemble_aggregate, PickEngine};
use crate::report::{build_report, team_ids};
use crate::selection::{resolve_models, ModelRequest, SelectionPlan, SuperdogFallback};
use crate::sources::Collaborators;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratePicksRequest {
    /// Display name, as a human would type it.
    pub picker_name: String,
    pub slate: SlateId,
    #[serde(default)]
    pub models: ModelRequest,
    #[serde(default)]
    pub fallback: SuperdogFallback,
    #[serde(default)]
    pub dry_run: bool,
}

impl GeneratePicksRequest {
    pub fn new(picker_name: impl Into<String>, slate: impl Into<SlateId>) -> Self {
        Self {
            picker_name: picker_name.into(),
            slate: slate.into(),
            models: ModelRequest::default(),
            fallback: SuperdogFallback::default(),
            dry_run: false,
        }
    }

    pub fn with_models(mut self, models: ModelRequest) -> Self {
        self.models = models;
        self
    }

    pub fn with_fallback(mut self, fallback: SuperdogFallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

pub async fn generate_picks(
    request: &GeneratePicksRequest,
    collaborators: Collaborators<'_>,
) -> Result<PickAggregate> {
    info!(
        "Generating picks for {} on slate {}{}",
        request.picker_name,
        request.slate,
        if request.dry_run { " (dry run)" } else { "" }
    );

    let picker = collaborators
        .pickers
        .picker_by_name(&request.picker_name)
        .await?
        .ok_or_else(|| PickError::PickerNotFound(request.picker_name.clone()))?;

    let slate = collaborators
        .slates
        .slate(&request.slate)
        .await?
        .ok_or_else(|| PickError::SlateNotFound(request.slate.clone()))?;

    let games = collaborators.slates.games(&slate.id).await?;
    info!(
        "Slate {} ({} week {}): {} games",
        slate.id,
        slate.season,
        slate.week,
        games.len()
    );

    let plan = SelectionPlan::new(&request.models, request.fallback);
    let models = resolve_models(collaborators.models, &plan).await?;

    let classified = PickEngine::new(&models)
        .run(&games)
        .with_context(|| format!("Failed to classify games on slate {}", slate.id))?;

    let streak = collaborators
        .streaks
        .streak_pick(&picker.id, &slate.season, slate.week)
        .await?;
    if streak.is_none() {
        info!("No streak pick available for {} in week {}", picker.name, slate.week);
    }

    let aggregate = assemble_aggregate(&picker, &slate, classified, streak);

    let teams = collaborators.teams.teams(&team_ids(&aggregate)).await?;
    let report = build_report(&aggregate, &teams);

    if request.dry_run {
        info!("Dry run: pick set {} not persisted", aggregate.id);
    } else {
        collaborators.persistence.commit(&aggregate).await?;
    }

    collaborators
        .rendering
        .render(&slate, &report)
        .await
        .with_context(|| format!("Failed to render report for slate {}", slate.id))?;

    info!(
        "Generated {} picks for {} on slate {}",
        aggregate.pick_count(),
        picker.name,
        slate.id
    );

    Ok(aggregate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CanonicalPrediction, DeclaredGame, ModelBundle, ModelCalibration, ModelId,
        ModelPerformance, Picker, PickerId, PredictionId, SeasonId, Slate, StreakPick, Team,
        TeamId,
    };
    use crate::sources::{InMemoryReportSink, InMemoryStore};

    fn prediction(id: &str, home: &str, road: &str, spread: f64) -> CanonicalPrediction {
        CanonicalPrediction {
            id: PredictionId::from(id),
            home: TeamId::from(home),
            road: TeamId::from(road),
            neutral_site: false,
            spread,
        }
    }

    fn team(id: &str, school: &str, name: &str) -> Team {
        Team {
            id: TeamId::from(id),
            school: school.to_string(),
            name: name.to_string(),
        }
    }

    fn store() -> InMemoryStore {
        let slate = Slate {
            id: SlateId::from("2023-w6"),
            season: SeasonId::from("2023"),
            week: 6,
            file_name: "week6.xlsx".to_string(),
        };
        let games = vec![
            DeclaredGame::superdog(20, "kansas", "texas", 10),
            DeclaredGame::straight_up(1, "michigan", "ohio-state"),
            DeclaredGame::noisy_spread(2, "iowa", "minnesota", 3),
        ];
        let model = ModelBundle {
            performance: ModelPerformance {
                model: ModelId::from("line"),
                calibration: ModelCalibration {
                    bias: 0.0,
                    std_dev: 10.0,
                },
                straight_up_win_rate: 0.72,
                mean_absolute_error: 10.5,
            },
            predictions: vec![
                prediction("g1", "michigan", "ohio-state", 7.0),
                prediction("g2", "iowa", "minnesota", 1.0),
                prediction("g3", "kansas", "texas", -10.0),
            ],
        };

        InMemoryStore::new()
            .with_slate(slate, games)
            .with_model(model)
            .with_picker(Picker {
                id: PickerId::from("p-7"),
                name: "Phil".to_string(),
            })
            .with_streak(
                PickerId::from("p-7"),
                SeasonId::from("2023"),
                6,
                StreakPick {
                    picks: vec![TeamId::from("michigan")],
                    predicted_spread: 7.0,
                    predicted_probability: 0.76,
                },
            )
            .with_team(team("michigan", "Michigan", "Wolverines"))
            .with_team(team("ohio-state", "Ohio State", "Buckeyes"))
            .with_team(team("iowa", "Iowa", "Hawkeyes"))
            .with_team(team("minnesota", "Minnesota", "Golden Gophers"))
            .with_team(team("kansas", "Kansas", "Jayhawks"))
            .with_team(team("texas", "Texas", "Longhorns"))
    }

    #[tokio::test]
    async fn test_generate_picks_end_to_end() {
        let store = store();
        let sink = InMemoryReportSink::new();
        let request = GeneratePicksRequest::new("Phil", "2023-w6");

        let aggregate = generate_picks(&request, Collaborators::from_store(&store, &sink))
            .await
            .unwrap();

        assert_eq!(aggregate.picker, PickerId::from("p-7"));
        assert_eq!(aggregate.week, 6);
        assert_eq!(aggregate.straight_up.len(), 1);
        assert_eq!(aggregate.noisy_spread.len(), 1);
        assert_eq!(aggregate.superdogs.len(), 1);
        assert_eq!(aggregate.pick_count(), 4);
        assert_eq!(aggregate.straight_up[0].pick, TeamId::from("michigan"));
        // Iowa by 1 against a 3-point threshold: Minnesota covers
        assert_eq!(aggregate.noisy_spread[0].pick, TeamId::from("minnesota"));
        assert_eq!(
            aggregate.selected_superdog().map(|s| s.underdog.clone()),
            Some(TeamId::from("kansas"))
        );

        let committed = store.committed();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0], aggregate);

        let rendered = sink.rendered();
        assert_eq!(rendered.len(), 1);
        let (slate, report) = &rendered[0];
        assert_eq!(slate.file_name, "week6.xlsx");
        assert_eq!(report.row(1).unwrap().cells[2], "Wolverines");
        // Streak lands halfway between row 2 and row 20
        assert_eq!(report.row(11).unwrap().cells[1], "BEAT THE STREAK!");
    }

    #[tokio::test]
    async fn test_dry_run_skips_persistence() {
        let store = store();
        let sink = InMemoryReportSink::new();
        let request = GeneratePicksRequest::new("Phil", "2023-w6").dry_run(true);

        generate_picks(&request, Collaborators::from_store(&store, &sink))
            .await
            .unwrap();

        assert!(store.committed().is_empty());
        assert_eq!(sink.rendered().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_commit_renders_nothing() {
        let store = store().with_failing_commits();
        let sink = InMemoryReportSink::new();
        let request = GeneratePicksRequest::new("Phil", "2023-w6");

        let result = generate_picks(&request, Collaborators::from_store(&store, &sink)).await;

        assert!(result.is_err());
        assert!(store.committed().is_empty());
        assert!(sink.rendered().is_empty());
    }

    #[tokio::test]
    async fn test_unresolvable_game_aborts_everything() {
        let store = store().with_slate(
            Slate {
                id: SlateId::from("2023-w7"),
                season: SeasonId::from("2023"),
                week: 7,
                file_name: "week7.xlsx".to_string(),
            },
            vec![
                DeclaredGame::straight_up(1, "michigan", "ohio-state"),
                DeclaredGame::straight_up(2, "michigan", "minnesota"),
            ],
        );
        let sink = InMemoryReportSink::new();
        let request = GeneratePicksRequest::new("Phil", "2023-w7");

        let err = generate_picks(&request, Collaborators::from_store(&store, &sink))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PickError>(),
            Some(PickError::MismatchedMatchup { .. })
        ));
        assert!(store.committed().is_empty());
        assert!(sink.rendered().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_picker_and_slate() {
        let store = store();
        let sink = InMemoryReportSink::new();

        let err = generate_picks(
            &GeneratePicksRequest::new("Nobody", "2023-w6"),
            Collaborators::from_store(&store, &sink),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<PickError>(),
            Some(&PickError::PickerNotFound("Nobody".to_string()))
        );

        let err = generate_picks(
            &GeneratePicksRequest::new("Phil", "2031-w1"),
            Collaborators::from_store(&store, &sink),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<PickError>(),
            Some(&PickError::SlateNotFound(SlateId::from("2031-w1")))
        );
        assert!(sink.rendered().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_model_missing() {
        let store = store();
        let sink = InMemoryReportSink::new();
        let request = GeneratePicksRequest::new("Phil", "2023-w6")
            .with_models(ModelRequest::all(ModelId::from("elo")));

        let err = generate_picks(&request, Collaborators::from_store(&store, &sink))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PickError>(),
            Some(PickError::ModelNotFound { .. })
        ));
        assert!(store.committed().is_empty());
    }
}
