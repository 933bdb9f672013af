//! Model Selection Policy
//!
//! Decides which calibrated model serves each pick category. Explicit model
//! references always win. Otherwise straight-up picks use the model with the
//! best straight-up win rate and noisy-spread picks the model with the lowest
//! mean absolute error. Superdog picks follow [`SuperdogFallback`].

use crate::error::PickError;
use crate::models::{ModelBundle, ModelId, PickCategory, RankingMetric};
use crate::sources::ModelSource;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Optional explicit model per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub straight_up: Option<ModelId>,
    pub noisy_spread: Option<ModelId>,
    pub superdog: Option<ModelId>,
}

impl ModelRequest {
    /// One model for every category.
    pub fn all(model: ModelId) -> Self {
        Self {
            straight_up: Some(model.clone()),
            noisy_spread: Some(model.clone()),
            superdog: Some(model),
        }
    }
}

/// Where the superdog model comes from when none is named explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuperdogFallback {
    /// Reuse whatever the noisy-spread category resolved to, explicit or not.
    #[default]
    SharedWithNoisySpread,
    /// Always rank independently by lowest mean absolute error.
    Independent,
}

impl FromStr for SuperdogFallback {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "shared" | "shared_with_noisy_spread" => Ok(SuperdogFallback::SharedWithNoisySpread),
            "independent" => Ok(SuperdogFallback::Independent),
            other => anyhow::bail!("unknown superdog fallback '{}'", other),
        }
    }
}

/// How one category's model is obtained.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelChoice {
    Explicit(ModelId),
    Best(RankingMetric),
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelChoice::Explicit(id) => write!(f, "explicit '{}'", id),
            ModelChoice::Best(metric) => write!(f, "{}", metric),
        }
    }
}

/// Per-category model choices, before anything is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPlan {
    pub straight_up: ModelChoice,
    pub noisy_spread: ModelChoice,
    pub superdog: ModelChoice,
}

impl SelectionPlan {
    pub fn new(request: &ModelRequest, fallback: SuperdogFallback) -> Self {
        let straight_up = request
            .straight_up
            .clone()
            .map(ModelChoice::Explicit)
            .unwrap_or(ModelChoice::Best(RankingMetric::StraightUpWins));

        let noisy_spread = request
            .noisy_spread
            .clone()
            .map(ModelChoice::Explicit)
            .unwrap_or(ModelChoice::Best(RankingMetric::MeanAbsoluteError));

        let superdog = match (&request.superdog, fallback) {
            (Some(id), _) => ModelChoice::Explicit(id.clone()),
            (None, SuperdogFallback::SharedWithNoisySpread) => noisy_spread.clone(),
            (None, SuperdogFallback::Independent) => {
                ModelChoice::Best(RankingMetric::MeanAbsoluteError)
            }
        };

        Self {
            straight_up,
            noisy_spread,
            superdog,
        }
    }

    pub fn choice(&self, category: PickCategory) -> &ModelChoice {
        match category {
            PickCategory::StraightUp => &self.straight_up,
            PickCategory::NoisySpread => &self.noisy_spread,
            PickCategory::Superdog => &self.superdog,
        }
    }
}

/// One resolved model bundle per category.
#[derive(Debug, Clone)]
pub struct CategoryModels {
    pub straight_up: Arc<ModelBundle>,
    pub noisy_spread: Arc<ModelBundle>,
    pub superdog: Arc<ModelBundle>,
}

impl CategoryModels {
    /// Every category served by the same model.
    pub fn uniform(model: ModelBundle) -> Self {
        let model = Arc::new(model);
        Self {
            straight_up: model.clone(),
            noisy_spread: model.clone(),
            superdog: model,
        }
    }

    pub fn get(&self, category: PickCategory) -> &ModelBundle {
        match category {
            PickCategory::StraightUp => &self.straight_up,
            PickCategory::NoisySpread => &self.noisy_spread,
            PickCategory::Superdog => &self.superdog,
        }
    }
}

/// Fetch the bundle for every category in the plan.
///
/// Each distinct choice is fetched once; categories sharing a choice share
/// the same bundle.
pub async fn resolve_models(
    source: &dyn ModelSource,
    plan: &SelectionPlan,
) -> Result<CategoryModels> {
    let mut fetched = HashMap::new();
    let straight_up =
        resolve_category(source, plan, PickCategory::StraightUp, &mut fetched).await?;
    let noisy_spread =
        resolve_category(source, plan, PickCategory::NoisySpread, &mut fetched).await?;
    let superdog = resolve_category(source, plan, PickCategory::Superdog, &mut fetched).await?;

    Ok(CategoryModels {
        straight_up,
        noisy_spread,
        superdog,
    })
}

async fn resolve_category(
    source: &dyn ModelSource,
    plan: &SelectionPlan,
    category: PickCategory,
    fetched: &mut HashMap<ModelChoice, Arc<ModelBundle>>,
) -> Result<Arc<ModelBundle>> {
    let choice = plan.choice(category);
    let bundle = match fetched.get(choice) {
        Some(bundle) => bundle.clone(),
        None => {
            let bundle = Arc::new(fetch(source, category, choice).await?);
            fetched.insert(choice.clone(), bundle.clone());
            bundle
        }
    };
    info!(
        "Using model '{}' for {} picks ({}, {} predictions)",
        bundle.id(),
        category,
        choice,
        bundle.predictions.len()
    );
    Ok(bundle)
}

async fn fetch(
    source: &dyn ModelSource,
    category: PickCategory,
    choice: &ModelChoice,
) -> Result<ModelBundle> {
    match choice {
        ModelChoice::Explicit(id) => source
            .model(id)
            .await
            .with_context(|| format!("failed to look up model '{}' for {} picks", id, category))?
            .ok_or_else(|| {
                PickError::ModelNotFound {
                    category,
                    model: id.clone(),
                }
                .into()
            }),
        ModelChoice::Best(metric) => source
            .best_model(*metric)
            .await
            .with_context(|| format!("failed to rank models for {} picks", category))?
            .ok_or_else(|| {
                PickError::NoRankedModel {
                    category,
                    metric: *metric,
                }
                .into()
            }),
    }
}
