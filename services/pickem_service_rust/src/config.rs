//! Configuration for the pick'em service
//!
//! Loaded from environment variables (after `.env`), with command-line flags
//! taking precedence where both exist.

use anyhow::{Context, Result};
use pickem_core::SuperdogFallback;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_OUTPUT_DIR: &str = "picks";

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL URL; required unless every collaborator is in-memory.
    pub database_url: Option<String>,
    /// Directory the rendered slate reports are written to.
    pub output_dir: PathBuf,
    /// Superdog model source when none is named (default: shared with noisy-spread)
    pub superdog_fallback: SuperdogFallback,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            superdog_fallback: SuperdogFallback::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let superdog_fallback = match env::var("SUPERDOG_MODEL_FALLBACK") {
            Ok(v) => v
                .parse::<SuperdogFallback>()
                .context("SUPERDOG_MODEL_FALLBACK must be 'shared' or 'independent'")?,
            Err(_) => SuperdogFallback::default(),
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            output_dir: env::var("REPORT_OUTPUT_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            superdog_fallback,
        })
    }

    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL environment variable must be set")
    }
}
