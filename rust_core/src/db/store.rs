//! PostgreSQL-backed collaborators.
//!
//! Reads are retried on transient failures. A pick set is written inside a
//! single transaction, and a retry re-runs the whole transaction, so either
//! every record of an aggregate is committed or none is.

use super::retry::{with_retry, RetryPolicy};
use crate::error::PickError;
use crate::models::{
    CanonicalPrediction, DeclaredGame, ModelBundle, ModelCalibration, ModelId, ModelPerformance,
    NoisySpreadPick, PickAggregate, Picker, PickerId, RankingMetric, SeasonId, Slate,
    SlateGameRecord, SlateId, StraightUpPick, StreakPick, SuperdogPick, Team, TeamId,
};
use crate::sources::{
    ModelSource, PersistenceSink, PickerSource, SlateSource, StreakSource, TeamDirectory,
    TeamSource,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PgPickemStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgPickemStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_bundle(&self, row: ModelRow) -> Result<ModelBundle> {
        let pool = &self.pool;
        let model = row.id.as_str();
        let predictions = with_retry("load predictions", self.retry, move || async move {
            sqlx::query_as::<_, PredictionRow>(
                r#"
                SELECT id, home, road, neutral_site, spread
                FROM predictions
                WHERE model_id = $1
                ORDER BY id
                "#,
            )
            .bind(model)
            .fetch_all(pool)
            .await
            .map_err(anyhow::Error::from)
        })
        .await
        .with_context(|| format!("Failed to load predictions for model {}", row.id))?;

        debug!("Loaded {} predictions for model {}", predictions.len(), row.id);

        Ok(ModelBundle {
            performance: row.into(),
            predictions: predictions.into_iter().map(Into::into).collect(),
        })
    }

    async fn write_pick_set(&self, aggregate: &PickAggregate) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO pick_sets (id, picker_id, slate_id, season, week, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(aggregate.id)
        .bind(aggregate.picker.as_str())
        .bind(aggregate.slate.as_str())
        .bind(aggregate.season.as_str())
        .bind(aggregate.week as i32)
        .bind(aggregate.created_at)
        .execute(&mut *tx)
        .await?;

        for pick in &aggregate.straight_up {
            insert_straight_up(&mut tx, aggregate.id, pick).await?;
        }
        for pick in &aggregate.noisy_spread {
            insert_noisy_spread(&mut tx, aggregate.id, pick).await?;
        }
        for pick in &aggregate.superdogs {
            insert_superdog(&mut tx, aggregate.id, pick).await?;
        }
        if let Some(streak) = &aggregate.streak {
            insert_streak(&mut tx, aggregate.id, streak).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl SlateSource for PgPickemStore {
    async fn slate(&self, id: &SlateId) -> Result<Option<Slate>> {
        let pool = &self.pool;
        let row = with_retry("load slate", self.retry, move || async move {
            sqlx::query_as::<_, SlateRow>(
                "SELECT id, season, week, file_name FROM slates WHERE id = $1",
            )
            .bind(id.as_str())
            .fetch_optional(pool)
            .await
            .map_err(anyhow::Error::from)
        })
        .await
        .with_context(|| format!("Failed to load slate {}", id))?;

        Ok(row.map(Into::into))
    }

    async fn games(&self, id: &SlateId) -> Result<Vec<DeclaredGame>> {
        let pool = &self.pool;
        let rows = with_retry("load slate games", self.retry, move || async move {
            sqlx::query_as::<_, SlateGameRow>(
                r#"
                SELECT row, home, road, neutral_site, noisy_spread, gotw, superdog,
                       underdog, overdog, value, rank1, rank2
                FROM slate_games
                WHERE slate_id = $1
                ORDER BY row
                "#,
            )
            .bind(id.as_str())
            .fetch_all(pool)
            .await
            .map_err(anyhow::Error::from)
        })
        .await
        .with_context(|| format!("Failed to load games for slate {}", id))?;

        rows.into_iter()
            .map(|row| {
                let record = row.into_record()?;
                DeclaredGame::try_from(record).map_err(anyhow::Error::from)
            })
            .collect()
    }
}

#[async_trait]
impl ModelSource for PgPickemStore {
    async fn model(&self, id: &ModelId) -> Result<Option<ModelBundle>> {
        let pool = &self.pool;
        let row = with_retry("load model", self.retry, move || async move {
            sqlx::query_as::<_, ModelRow>(
                r#"
                SELECT id, bias, std_dev, straight_up_win_rate, mean_absolute_error
                FROM models
                WHERE id = $1
                "#,
            )
            .bind(id.as_str())
            .fetch_optional(pool)
            .await
            .map_err(anyhow::Error::from)
        })
        .await
        .with_context(|| format!("Failed to load model {}", id))?;

        match row {
            Some(row) => Ok(Some(self.load_bundle(row).await?)),
            None => Ok(None),
        }
    }

    async fn best_model(&self, metric: RankingMetric) -> Result<Option<ModelBundle>> {
        let order = match metric {
            RankingMetric::StraightUpWins => "straight_up_win_rate DESC",
            RankingMetric::MeanAbsoluteError => "mean_absolute_error ASC",
        };
        let sql = format!(
            "SELECT id, bias, std_dev, straight_up_win_rate, mean_absolute_error \
             FROM models ORDER BY {order}, ranked_seq ASC LIMIT 1"
        );

        let pool = &self.pool;
        let sql = sql.as_str();
        let row = with_retry("rank models", self.retry, move || async move {
            sqlx::query_as::<_, ModelRow>(sql)
                .fetch_optional(pool)
                .await
                .map_err(anyhow::Error::from)
        })
        .await
        .with_context(|| format!("Failed to rank models by {}", metric))?;

        match row {
            Some(row) => Ok(Some(self.load_bundle(row).await?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl PickerSource for PgPickemStore {
    async fn picker_by_name(&self, name: &str) -> Result<Option<Picker>> {
        let pool = &self.pool;
        let row = with_retry("load picker", self.retry, move || async move {
            sqlx::query_as::<_, PickerRow>("SELECT id, name FROM pickers WHERE name = $1")
                .bind(name)
                .fetch_optional(pool)
                .await
                .map_err(anyhow::Error::from)
        })
        .await
        .with_context(|| format!("Failed to look up picker {}", name))?;

        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl StreakSource for PgPickemStore {
    async fn streak_pick(
        &self,
        picker: &PickerId,
        season: &SeasonId,
        week: u32,
    ) -> Result<Option<StreakPick>> {
        let Some(computed_week) = streak_computed_week(week) else {
            return Ok(None);
        };

        let pool = &self.pool;
        let row = with_retry("load streak prediction", self.retry, move || async move {
            sqlx::query_as::<_, StreakRow>(
                r#"
                SELECT picks, predicted_spread, predicted_probability
                FROM streak_predictions
                WHERE picker_id = $1 AND season = $2 AND week = $3
                "#,
            )
            .bind(picker.as_str())
            .bind(season.as_str())
            .bind(computed_week as i32)
            .fetch_optional(pool)
            .await
            .map_err(anyhow::Error::from)
        })
        .await
        .with_context(|| {
            format!(
                "Failed to load streak prediction for picker {} ({} week {})",
                picker, season, computed_week
            )
        })?;

        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl TeamSource for PgPickemStore {
    async fn teams(&self, ids: &[TeamId]) -> Result<TeamDirectory> {
        let keys: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();
        let keys = &keys;
        let pool = &self.pool;

        let rows = with_retry("load teams", self.retry, move || async move {
            sqlx::query_as::<_, TeamRow>("SELECT id, school, name FROM teams WHERE id = ANY($1)")
                .bind(keys)
                .fetch_all(pool)
                .await
                .map_err(anyhow::Error::from)
        })
        .await
        .context("Failed to load team names")?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let team = Team::from(row);
                (team.id.clone(), team)
            })
            .collect())
    }
}

#[async_trait]
impl PersistenceSink for PgPickemStore {
    async fn commit(&self, aggregate: &PickAggregate) -> Result<()> {
        with_retry("commit pick set", self.retry, move || {
            self.write_pick_set(aggregate)
        })
        .await
        .with_context(|| {
            format!(
                "Failed to commit pick set {} for picker {} on slate {}",
                aggregate.id, aggregate.picker, aggregate.slate
            )
        })?;

        info!(
            "Committed pick set {} ({} records)",
            aggregate.id,
            aggregate.pick_count()
        );
        Ok(())
    }
}

// ============================================================================
// Pick record inserts
// ============================================================================

async fn insert_straight_up(conn: &mut PgConnection, set: Uuid, pick: &StraightUpPick) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO straight_up_picks (
            pick_set_id, row, home, road, rank1, rank2, gotw, neutral_site,
            neutral_disagreement, swap, pick, predicted_spread, predicted_probability,
            modeled_game, model_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        "#,
    )
    .bind(set)
    .bind(pick.row as i32)
    .bind(pick.home.as_str())
    .bind(pick.road.as_str())
    .bind(pick.rank1.map(|r| r as i32))
    .bind(pick.rank2.map(|r| r as i32))
    .bind(pick.gotw)
    .bind(pick.neutral_site)
    .bind(pick.neutral_disagreement)
    .bind(pick.swap)
    .bind(pick.pick.as_str())
    .bind(pick.predicted_spread)
    .bind(pick.predicted_probability)
    .bind(pick.modeled_game.as_str())
    .bind(pick.model.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_noisy_spread(
    conn: &mut PgConnection,
    set: Uuid,
    pick: &NoisySpreadPick,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO noisy_spread_picks (
            pick_set_id, row, home, road, rank1, rank2, noisy_spread, neutral_site,
            neutral_disagreement, swap, pick, predicted_spread, predicted_probability,
            modeled_game, model_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        "#,
    )
    .bind(set)
    .bind(pick.row as i32)
    .bind(pick.home.as_str())
    .bind(pick.road.as_str())
    .bind(pick.rank1.map(|r| r as i32))
    .bind(pick.rank2.map(|r| r as i32))
    .bind(pick.noisy_spread)
    .bind(pick.neutral_site)
    .bind(pick.neutral_disagreement)
    .bind(pick.swap)
    .bind(pick.pick.as_str())
    .bind(pick.predicted_spread)
    .bind(pick.predicted_probability)
    .bind(pick.modeled_game.as_str())
    .bind(pick.model.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_superdog(conn: &mut PgConnection, set: Uuid, pick: &SuperdogPick) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO superdog_picks (
            pick_set_id, row, underdog, overdog, rank1, rank2, value, neutral_site,
            neutral_disagreement, swap, pick, predicted_spread, predicted_probability,
            modeled_game, model_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        "#,
    )
    .bind(set)
    .bind(pick.row as i32)
    .bind(pick.underdog.as_str())
    .bind(pick.overdog.as_str())
    .bind(pick.rank1.map(|r| r as i32))
    .bind(pick.rank2.map(|r| r as i32))
    .bind(pick.value as i32)
    .bind(pick.neutral_site)
    .bind(pick.neutral_disagreement)
    .bind(pick.swap)
    .bind(pick.pick.as_ref().map(|p| p.as_str()))
    .bind(pick.predicted_spread)
    .bind(pick.predicted_probability)
    .bind(pick.modeled_game.as_str())
    .bind(pick.model.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_streak(conn: &mut PgConnection, set: Uuid, streak: &StreakPick) -> Result<()> {
    let picks: Vec<String> = streak.picks.iter().map(|p| p.as_str().to_string()).collect();

    sqlx::query(
        r#"
        INSERT INTO streak_picks (pick_set_id, picks, predicted_spread, predicted_probability)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(set)
    .bind(&picks)
    .bind(streak.predicted_spread)
    .bind(streak.predicted_probability)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Streak predictions are stored under the week they were computed in, which
/// is the week before the slate they apply to. Week 0 has no such week.
fn streak_computed_week(slate_week: u32) -> Option<u32> {
    slate_week.checked_sub(1)
}

// ============================================================================
// Row types
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SlateRow {
    id: String,
    season: String,
    week: i32,
    file_name: String,
}

impl From<SlateRow> for Slate {
    fn from(row: SlateRow) -> Self {
        Slate {
            id: row.id.into(),
            season: row.season.into(),
            week: u32::try_from(row.week).unwrap_or(0),
            file_name: row.file_name,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SlateGameRow {
    #[sqlx(rename = "row")]
    slate_row: i32,
    home: Option<String>,
    road: Option<String>,
    neutral_site: bool,
    noisy_spread: Option<i32>,
    gotw: Option<bool>,
    superdog: bool,
    underdog: Option<String>,
    overdog: Option<String>,
    value: Option<i32>,
    rank1: Option<i32>,
    rank2: Option<i32>,
}

impl SlateGameRow {
    fn into_record(self) -> Result<SlateGameRecord> {
        let row = u32::try_from(self.slate_row)
            .with_context(|| format!("slate row number {} is negative", self.slate_row))?;
        let value = match self.value {
            Some(v) => Some(u32::try_from(v).map_err(|_| PickError::InvalidDeclaredGame {
                row,
                reason: format!("negative payout value {v}"),
            })?),
            None => None,
        };

        Ok(SlateGameRecord {
            row,
            home: self.home.map(TeamId::from),
            road: self.road.map(TeamId::from),
            neutral_site: self.neutral_site,
            noisy_spread: self.noisy_spread,
            gotw: self.gotw,
            superdog: self.superdog,
            underdog: self.underdog.map(TeamId::from),
            overdog: self.overdog.map(TeamId::from),
            value,
            rank1: self.rank1.and_then(|r| u32::try_from(r).ok()),
            rank2: self.rank2.and_then(|r| u32::try_from(r).ok()),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ModelRow {
    id: String,
    bias: f64,
    std_dev: f64,
    straight_up_win_rate: f64,
    mean_absolute_error: f64,
}

impl From<ModelRow> for ModelPerformance {
    fn from(row: ModelRow) -> Self {
        ModelPerformance {
            model: ModelId::from(row.id),
            calibration: ModelCalibration {
                bias: row.bias,
                std_dev: row.std_dev,
            },
            straight_up_win_rate: row.straight_up_win_rate,
            mean_absolute_error: row.mean_absolute_error,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PredictionRow {
    id: String,
    home: String,
    road: String,
    neutral_site: bool,
    spread: f64,
}

impl From<PredictionRow> for CanonicalPrediction {
    fn from(row: PredictionRow) -> Self {
        CanonicalPrediction {
            id: row.id.into(),
            home: row.home.into(),
            road: row.road.into(),
            neutral_site: row.neutral_site,
            spread: row.spread,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PickerRow {
    id: String,
    name: String,
}

impl From<PickerRow> for Picker {
    fn from(row: PickerRow) -> Self {
        Picker {
            id: row.id.into(),
            name: row.name,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StreakRow {
    picks: Vec<String>,
    predicted_spread: f64,
    predicted_probability: f64,
}

impl From<StreakRow> for StreakPick {
    fn from(row: StreakRow) -> Self {
        StreakPick {
            picks: row.picks.into_iter().map(TeamId::from).collect(),
            predicted_spread: row.predicted_spread,
            predicted_probability: row.predicted_probability,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TeamRow {
    id: String,
    school: String,
    name: String,
}

impl From<TeamRow> for Team {
    fn from(row: TeamRow) -> Self {
        Team {
            id: row.id.into(),
            school: row.school,
            name: row.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slate_game_row_conversion() {
        let row = SlateGameRow {
            slate_row: 4,
            home: Some("michigan".into()),
            road: Some("ohio-state".into()),
            neutral_site: false,
            noisy_spread: Some(-7),
            gotw: None,
            superdog: false,
            underdog: None,
            overdog: None,
            value: None,
            rank1: Some(0),
            rank2: Some(3),
        };

        let game = DeclaredGame::try_from(row.into_record().unwrap()).unwrap();
        assert_eq!(
            game,
            DeclaredGame::noisy_spread(4, "michigan", "ohio-state", -7).with_ranks(None, Some(3))
        );
    }

    #[test]
    fn test_negative_row_rejected() {
        let row = SlateGameRow {
            slate_row: -1,
            home: None,
            road: None,
            neutral_site: false,
            noisy_spread: None,
            gotw: None,
            superdog: true,
            underdog: Some("kansas".into()),
            overdog: Some("texas".into()),
            value: Some(10),
            rank1: None,
            rank2: None,
        };
        assert!(row.into_record().is_err());
    }

    #[test]
    fn test_negative_payout_rejected() {
        let row = SlateGameRow {
            slate_row: 21,
            home: None,
            road: None,
            neutral_site: false,
            noisy_spread: None,
            gotw: None,
            superdog: true,
            underdog: Some("kansas".into()),
            overdog: Some("texas".into()),
            value: Some(-10),
            rank1: None,
            rank2: None,
        };

        let err = row.into_record().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PickError>(),
            Some(PickError::InvalidDeclaredGame { row: 21, .. })
        ));
    }

    #[test]
    fn test_streak_lookup_uses_previous_week() {
        assert_eq!(streak_computed_week(6), Some(5));
        assert_eq!(streak_computed_week(1), Some(0));
        assert_eq!(streak_computed_week(0), None);
    }

    #[test]
    fn test_streak_row_conversion() {
        let streak = StreakPick::from(StreakRow {
            picks: vec!["georgia".into(), "ohio-state".into()],
            predicted_spread: 9.5,
            predicted_probability: 0.7,
        });
        assert_eq!(
            streak.picks,
            vec![TeamId::from("georgia"), TeamId::from("ohio-state")]
        );
    }

    #[test]
    fn test_model_row_conversion() {
        let performance = ModelPerformance::from(ModelRow {
            id: "sagarin".into(),
            bias: 0.4,
            std_dev: 13.2,
            straight_up_win_rate: 0.74,
            mean_absolute_error: 10.9,
        });
        assert_eq!(performance.model, ModelId::from("sagarin"));
        assert_eq!(performance.calibration.std_dev, 13.2);
    }
}
