//! trackpd-report configuration
//!
//! Reads the `[store]`, `[logging]` and `[report]` sections of the shared
//! TOML file and merges command-line overrides on top.

use crate::delivery::CachePolicy;
use crate::error::{ReportError, Result};
use crate::pipeline::chart::{ChartOptions, DEFAULT_CHART_HEIGHT, DEFAULT_CHART_WIDTH, DEFAULT_TICK_STRIDE};
use crate::pipeline::fetch::{CollectionNames, RecordLocators, ReportSubject};
use crate::pipeline::layout::{LayoutOverrides, PageLayout};
use crate::pipeline::table::TableTheme;
use crate::pipeline::{PipelineSettings, DEFAULT_ARTIFACT_NAME, DEFAULT_DOCUMENT_TITLE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use trackpd_common::config::{LoggingConfig, StoreSection};

pub const DEFAULT_PORT: u16 = 8866;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PROFILE_ID: &str = "h2MWRvrFY1XiInFR6xh5";
pub const DEFAULT_ACTIVITY_OWNER: &str = "ICHIwHSqwmhucxWc3C6KQ096DSY2";

/// Sections of the config file this service reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportFileConfig {
    pub store: StoreSection,
    pub logging: LoggingConfig,
    pub report: ReportSection,
}

/// `[report]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    pub host: String,
    pub port: u16,
    pub output_dir: PathBuf,
    pub artifact_name: String,
    pub document_title: String,
    pub regenerate_on_startup: bool,
    /// Seconds before a served artifact counts as stale; 0 = never
    pub max_age_secs: u64,
    pub tick_stride: usize,
    pub chart_width: u32,
    pub chart_height: u32,
    pub users_collection: String,
    pub profile_id: String,
    pub activity_owner: String,
    pub activity_subcollection: String,
    pub tremor_collection: String,
    pub layout: LayoutOverrides,
}

impl Default for ReportSection {
    fn default() -> Self {
        let collections = CollectionNames::default();
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            output_dir: PathBuf::from("."),
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            document_title: DEFAULT_DOCUMENT_TITLE.to_string(),
            regenerate_on_startup: true,
            max_age_secs: 0,
            tick_stride: DEFAULT_TICK_STRIDE,
            chart_width: DEFAULT_CHART_WIDTH,
            chart_height: DEFAULT_CHART_HEIGHT,
            users_collection: collections.users,
            profile_id: DEFAULT_PROFILE_ID.to_string(),
            activity_owner: DEFAULT_ACTIVITY_OWNER.to_string(),
            activity_subcollection: collections.activity,
            tremor_collection: collections.tremors,
            layout: LayoutOverrides::default(),
        }
    }
}

/// Values given on the command line (or their environment variables)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub credentials: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub max_age_secs: Option<u64>,
    pub profile_id: Option<String>,
    pub activity_owner: Option<String>,
}

/// Fully resolved service settings
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub host: String,
    pub port: u16,
    pub credentials: PathBuf,
    pub log_level: String,
    pub regenerate_on_startup: bool,
    pub cache_policy: CachePolicy,
    pub subject: ReportSubject,
    pub collections: CollectionNames,
    pub pipeline: PipelineSettings,
}

fn config_err(msg: impl Into<String>) -> ReportError {
    trackpd_common::Error::Config(msg.into()).into()
}

impl ReportSettings {
    /// Merge command line over file over defaults, then validate
    pub fn resolve(file: ReportFileConfig, cli: CliOverrides) -> Result<Self> {
        let report = file.report;

        if report.tick_stride == 0 {
            return Err(config_err("report.tick_stride must be at least 1"));
        }
        if report.chart_width == 0 || report.chart_height == 0 {
            return Err(config_err("report.chart_width and chart_height must be non-zero"));
        }
        if report.artifact_name.trim().is_empty() {
            return Err(config_err("report.artifact_name must not be empty"));
        }

        let layout = PageLayout::default().with_overrides(&report.layout);
        layout.validate()?;

        let pipeline = PipelineSettings {
            output_dir: cli.output_dir.unwrap_or(report.output_dir),
            artifact_name: report.artifact_name,
            document_title: report.document_title,
            chart: ChartOptions {
                width: report.chart_width,
                height: report.chart_height,
                tick_stride: report.tick_stride,
            },
            layout,
            theme: TableTheme::default(),
        };

        Ok(Self {
            host: cli.host.unwrap_or(report.host),
            port: cli.port.unwrap_or(report.port),
            credentials: cli.credentials.unwrap_or(file.store.credentials),
            log_level: file.logging.level,
            regenerate_on_startup: report.regenerate_on_startup,
            cache_policy: CachePolicy::from_max_age_secs(
                cli.max_age_secs.unwrap_or(report.max_age_secs),
            ),
            subject: ReportSubject {
                profile_id: cli.profile_id.unwrap_or(report.profile_id),
                activity_owner: cli.activity_owner.unwrap_or(report.activity_owner),
            },
            collections: CollectionNames {
                users: report.users_collection,
                activity: report.activity_subcollection,
                tremors: report.tremor_collection,
            },
            pipeline,
        })
    }

    pub fn locators(&self) -> RecordLocators {
        RecordLocators::for_subject(&self.subject, &self.collections)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults_resolve() {
        let settings =
            ReportSettings::resolve(ReportFileConfig::default(), CliOverrides::default()).unwrap();

        assert_eq!(settings.bind_address(), "0.0.0.0:8866");
        assert_eq!(settings.cache_policy, CachePolicy::PresenceOnly);
        assert!(settings.regenerate_on_startup);
        assert_eq!(settings.pipeline.artifact_path(), PathBuf::from("./users.pdf"));

        let locators = settings.locators();
        assert_eq!(locators.profile.to_string(), "users/h2MWRvrFY1XiInFR6xh5");
        assert_eq!(locators.activities, "users/ICHIwHSqwmhucxWc3C6KQ096DSY2/activity");
        assert_eq!(locators.tremors, "tremors");
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = ReportFileConfig::default();
        file.report.port = 9000;
        file.report.max_age_secs = 30;

        let cli = CliOverrides {
            port: Some(9100),
            output_dir: Some(PathBuf::from("/tmp/reports")),
            ..Default::default()
        };
        let settings = ReportSettings::resolve(file, cli).unwrap();

        assert_eq!(settings.port, 9100);
        assert_eq!(settings.cache_policy, CachePolicy::MaxAge(Duration::from_secs(30)));
        assert_eq!(
            settings.pipeline.artifact_path(),
            PathBuf::from("/tmp/reports/users.pdf")
        );
    }

    #[test]
    fn test_zero_tick_stride_rejected() {
        let mut file = ReportFileConfig::default();
        file.report.tick_stride = 0;
        let result = ReportSettings::resolve(file, CliOverrides::default());
        assert!(matches!(
            result,
            Err(ReportError::Common(trackpd_common::Error::Config(_)))
        ));
    }

    #[test]
    fn test_layout_section_parsed() {
        let file: ReportFileConfig = toml::from_str(
            "[report]\nport = 8000\n\n[report.layout]\ntremor_chart_y = -8.0\n",
        )
        .unwrap();
        let settings = ReportSettings::resolve(file, CliOverrides::default()).unwrap();
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.pipeline.layout.tremor_chart.y, -8.0);
    }
}
