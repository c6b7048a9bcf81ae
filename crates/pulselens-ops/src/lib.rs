//! Operational helpers: logging setup and report persistence.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use pulselens_types::{
    config::{OpsConfig, PulseConfig},
    result::PipelineReport,
    PulseError, Result,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

pub fn init_tracing(config: &OpsConfig) -> Result<()> {
    let filter = log_filter(&config.log_level)?;
    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| ops_error(format!("tracing init error: {err}")))?;
    Ok(())
}

/// Filter for `level`, or `info` when the directive does not parse.
pub fn log_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| ops_error(format!("failed to create log filter: {err}")))
}

/// Persisted record of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub config: PulseConfig,
    pub report: PipelineReport,
}

impl PulseReport {
    pub fn new(config: PulseConfig, report: PipelineReport) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            config,
            report,
        }
    }
}

/// Writes reports as pretty JSON files under a single directory.
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = ensure_report_dir(dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, report: &PulseReport) -> Result<PathBuf> {
        let timestamp = report.created_at.format("%Y%m%d_%H%M%S_%3f");
        let short_id = report.id.simple().to_string();
        let path = self
            .dir
            .join(format!("report_{timestamp}_{}.json", &short_id[..8]));
        let body = serde_json::to_string_pretty(report)
            .map_err(|err| ops_error(format!("failed to serialize report: {err}")))?;
        fs::write(&path, body)
            .map_err(|err| ops_error(format!("failed to write report {:?}: {err}", path)))?;
        info!("Report saved to {:?}", path);
        Ok(path)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<PulseReport> {
        let path = path.as_ref();
        let body = fs::read_to_string(path)
            .map_err(|err| ops_error(format!("failed to read report {:?}: {err}", path)))?;
        serde_json::from_str(&body)
            .map_err(|err| ops_error(format!("failed to parse report {:?}: {err}", path)))
    }
}

pub fn ensure_report_dir(path: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = path.as_ref().to_path_buf();
    fs::create_dir_all(&dir)
        .map_err(|err| ops_error(format!("failed to create report dir: {err}")))?;
    info!("Report directory ready at {:?}", dir);
    Ok(dir)
}

pub fn ops_error(message: impl Into<String>) -> PulseError {
    PulseError::Ops(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulselens_types::result::{HeartRateResult, HrvMetrics};

    #[test]
    fn saved_report_loads_back() {
        let dir = std::env::temp_dir().join(format!("pulselens-reports-{}", std::process::id()));
        let store = ReportStore::open(&dir).expect("open store");
        let report = PulseReport::new(
            PulseConfig::default(),
            PipelineReport {
                frame_count: 300,
                batch_count: 3,
                band_selected: true,
                result: HeartRateResult {
                    heart_rate_bpm: 72.0,
                    hrv_metrics: HrvMetrics {
                        sdnn_ms: 41.2,
                        rmssd_ms: 33.05,
                        valid: true,
                    },
                },
            },
        );

        let path = store.save(&report).expect("save report");
        assert!(path.starts_with(store.dir()));
        let loaded = ReportStore::load(&path).expect("load report");
        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.report, report.report);
        assert_eq!(loaded.config, report.config);
        fs::remove_dir_all(&dir).expect("cleanup");
    }

    #[test]
    fn loading_missing_report_is_an_ops_error() {
        let err = ReportStore::load("/nonexistent/report.json").unwrap_err();
        assert!(matches!(err, PulseError::Ops(_)));
    }

    #[test]
    fn invalid_log_level_falls_back_to_info() {
        assert!(EnvFilter::try_new("pulselens=loudest").is_err());
        let filter = log_filter("pulselens=loudest").expect("fallback filter");
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn valid_log_level_is_kept() {
        let filter = log_filter("pulselens_engine=debug").expect("filter");
        assert_eq!(filter.to_string(), "pulselens_engine=debug");
    }
}
