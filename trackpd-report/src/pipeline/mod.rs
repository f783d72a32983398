//! Report-assembly pipeline
//!
//! One regeneration run walks
//! `Idle → Fetching → Aggregating → Rendering(tremor) → Rendering(activity)
//! → Composing → Assembling → Persisted`. Every run rebuilds the whole
//! document. A failure at any stage aborts the run; the previous artifact
//! stays on disk until the final rename replaces it.

pub mod chart;
pub mod document;
pub mod fetch;
pub mod layout;
pub mod series;
pub mod table;

use crate::error::{ReportError, Result};
use chart::{render_activity_chart, render_tremor_chart, ChartOptions};
use document::{assemble_document, persist_artifact, DocumentParts};
use fetch::{fetch_records, FetchedRecords, RecordLocators, RecordSource};
use layout::PageLayout;
use series::{build_activity_series, build_tremor_series, ActivitySeries, TremorSeries};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use table::{compose_profile_table, ProfileTable, TableTheme};
use tracing::{debug, info};

/// Fixed artifact file name
pub const DEFAULT_ARTIFACT_NAME: &str = "users.pdf";

/// PDF title metadata
pub const DEFAULT_DOCUMENT_TITLE: &str = "User Information";

/// Regeneration state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Fetching,
    Aggregating,
    RenderingTremor,
    RenderingActivity,
    Composing,
    Assembling,
    Persisted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "Idle",
            Stage::Fetching => "Fetching",
            Stage::Aggregating => "Aggregating",
            Stage::RenderingTremor => "Rendering(tremor)",
            Stage::RenderingActivity => "Rendering(activity)",
            Stage::Composing => "Composing",
            Stage::Assembling => "Assembling",
            Stage::Persisted => "Persisted",
        };
        f.write_str(name)
    }
}

fn enter(stage: Stage) {
    debug!("Report pipeline: {}", stage);
}

/// Output locations and rendering parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub output_dir: PathBuf,
    pub artifact_name: String,
    pub document_title: String,
    pub chart: ChartOptions,
    pub layout: PageLayout,
    pub theme: TableTheme,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            document_title: DEFAULT_DOCUMENT_TITLE.to_string(),
            chart: ChartOptions::default(),
            layout: PageLayout::default(),
            theme: TableTheme::default(),
        }
    }
}

impl PipelineSettings {
    pub fn artifact_path(&self) -> PathBuf {
        self.output_dir.join(&self.artifact_name)
    }
}

/// Summary of one completed run
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub artifact_path: PathBuf,
    pub chart_paths: Vec<PathBuf>,
    pub profile_table: ProfileTable,
    pub tremor_series: TremorSeries,
    pub activity_series: ActivitySeries,
    /// x-axis labels drawn on the tremor chart
    pub tremor_ticks: Vec<usize>,
    pub pages: usize,
    pub bytes_written: usize,
}

/// Runs regenerations with fixed settings
#[derive(Debug, Clone)]
pub struct ReportPipeline {
    settings: Arc<PipelineSettings>,
}

impl ReportPipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.settings.artifact_path()
    }

    /// Rebuild the artifact from the current store contents
    pub async fn regenerate(
        &self,
        source: &dyn RecordSource,
        locators: &RecordLocators,
    ) -> Result<GeneratedReport> {
        let started = Instant::now();
        enter(Stage::Idle);

        enter(Stage::Fetching);
        let records = fetch_records(source, locators).await?;

        // Rendering and PDF assembly are CPU-bound and not Send-friendly
        let settings = Arc::clone(&self.settings);
        let report = tokio::task::spawn_blocking(move || build_report(&settings, records))
            .await
            .map_err(|e| ReportError::Task(e.to_string()))??;

        info!(
            "Report regenerated: {} ({} bytes, {} page(s), {} tremor samples, {} activity events) in {:.2?}",
            report.artifact_path.display(),
            report.bytes_written,
            report.pages,
            report.tremor_series.len(),
            report.activity_series.len(),
            started.elapsed()
        );

        Ok(report)
    }
}

fn build_report(settings: &PipelineSettings, records: FetchedRecords) -> Result<GeneratedReport> {
    enter(Stage::Aggregating);
    let tremor_series = build_tremor_series(&records.tremors);
    let activity_series = build_activity_series(&records.activities);

    std::fs::create_dir_all(&settings.output_dir)?;

    enter(Stage::RenderingTremor);
    let tremor_chart = render_tremor_chart(&tremor_series, &settings.chart)?;
    let tremor_path = tremor_chart.write_to_dir(&settings.output_dir)?;

    enter(Stage::RenderingActivity);
    let activity_chart = render_activity_chart(&activity_series, &settings.chart)?;
    let activity_path = activity_chart.write_to_dir(&settings.output_dir)?;

    enter(Stage::Composing);
    let profile_table = compose_profile_table(&records.profile);

    enter(Stage::Assembling);
    let parts = DocumentParts {
        title: &settings.document_title,
        table: &profile_table,
        theme: &settings.theme,
        tremor_chart: &tremor_chart,
        activity_chart: &activity_chart,
    };
    let assembled = assemble_document(&parts, &settings.layout)?;

    let artifact_path = settings.artifact_path();
    persist_artifact(&artifact_path, &assembled.bytes)?;
    enter(Stage::Persisted);

    Ok(GeneratedReport {
        artifact_path,
        chart_paths: vec![tremor_path, activity_path],
        profile_table,
        tremor_ticks: tremor_chart.ticks.clone(),
        tremor_series,
        activity_series,
        pages: assembled.pages,
        bytes_written: assembled.bytes.len(),
    })
}
