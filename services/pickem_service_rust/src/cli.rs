use clap::Parser;
use pickem_core::{GeneratePicksRequest, ModelId, ModelRequest, SuperdogFallback};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pickem")]
#[command(author = "Pickem Team")]
#[command(version)]
#[command(about = "Make weekly pick'em picks from calibrated model predictions", long_about = None)]
pub struct Cli {
    /// Picker display name
    pub picker: String,

    /// Slate identifier
    pub slate: String,

    /// Model for straight-up picks (default: best straight-up win rate)
    #[arg(long)]
    pub straight_model: Option<String>,

    /// Model for noisy-spread picks (default: lowest mean absolute error)
    #[arg(long)]
    pub noisy_spread_model: Option<String>,

    /// Model for superdog picks (default: see SUPERDOG_MODEL_FALLBACK)
    #[arg(long)]
    pub superdog_model: Option<String>,

    /// Compute and render picks without persisting them
    #[arg(long)]
    pub dry_run: bool,

    /// Directory for rendered reports
    #[arg(long, env = "REPORT_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print the finished pick set as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn model_request(&self) -> ModelRequest {
        ModelRequest {
            straight_up: self.straight_model.as_deref().map(ModelId::from),
            noisy_spread: self.noisy_spread_model.as_deref().map(ModelId::from),
            superdog: self.superdog_model.as_deref().map(ModelId::from),
        }
    }

    pub fn request(&self, fallback: SuperdogFallback) -> GeneratePicksRequest {
        GeneratePicksRequest::new(self.picker.clone(), self.slate.as_str())
            .with_models(self.model_request())
            .with_fallback(fallback)
            .dry_run(self.dry_run)
    }
}
