//! Writes rendered slate reports to disk as `picks_<slate file name>.tsv`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use pickem_core::{RenderingSink, Slate, SlateReport};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ReportFileSink {
    output_dir: PathBuf,
}

impl ReportFileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Report path for a slate. Only the final path component of the slate's
    /// file name is used.
    pub fn report_path(&self, slate: &Slate) -> PathBuf {
        let stem = Path::new(&slate.file_name)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| slate.id.to_string());
        self.output_dir.join(format!("picks_{stem}.tsv"))
    }
}

#[async_trait]
impl RenderingSink for ReportFileSink {
    async fn render(&self, slate: &Slate, report: &SlateReport) -> Result<()> {
        let path = self.report_path(slate);

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;
        tokio::fs::write(&path, report.to_tsv())
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!("Wrote {} report rows to {}", report.rows.len(), path.display());
        Ok(())
    }
}
