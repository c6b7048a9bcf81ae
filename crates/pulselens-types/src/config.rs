use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{PulseError, Result};

/// Parameters consumed at the pipeline entry point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    #[serde(default = "PipelineConfig::default_batch_size")]
    pub batch_size: usize,
    /// Output (width, height) of the spatial downscale.
    #[serde(default = "PipelineConfig::default_target_resolution")]
    pub target_resolution: (u32, u32),
    pub fps: f64,
    #[serde(default = "PipelineConfig::default_freq_min")]
    pub freq_min: f64,
    #[serde(default = "PipelineConfig::default_freq_max")]
    pub freq_max: f64,
}

impl PipelineConfig {
    pub const DEFAULT_BATCH_SIZE: usize = 100;
    pub const DEFAULT_TARGET_RESOLUTION: (u32, u32) = (320, 240);
    pub const DEFAULT_FREQ_MIN: f64 = 0.75;
    pub const DEFAULT_FREQ_MAX: f64 = 4.0;

    pub fn with_fps(fps: f64) -> Self {
        Self {
            batch_size: Self::DEFAULT_BATCH_SIZE,
            target_resolution: Self::DEFAULT_TARGET_RESOLUTION,
            fps,
            freq_min: Self::DEFAULT_FREQ_MIN,
            freq_max: Self::DEFAULT_FREQ_MAX,
        }
    }

    fn default_batch_size() -> usize {
        Self::DEFAULT_BATCH_SIZE
    }

    fn default_target_resolution() -> (u32, u32) {
        Self::DEFAULT_TARGET_RESOLUTION
    }

    fn default_freq_min() -> f64 {
        Self::DEFAULT_FREQ_MIN
    }

    fn default_freq_max() -> f64 {
        Self::DEFAULT_FREQ_MAX
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(PulseError::Configuration(
                "pipeline.batch_size must be greater than zero".into(),
            ));
        }
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(PulseError::Configuration(format!(
                "pipeline.fps must be a positive number (got {})",
                self.fps
            )));
        }
        let (width, height) = self.target_resolution;
        if width == 0 || height == 0 {
            return Err(PulseError::Configuration(
                "pipeline.target_resolution must be non-zero in both dimensions".into(),
            ));
        }
        if !self.freq_min.is_finite() || !self.freq_max.is_finite() {
            return Err(PulseError::Configuration(
                "pipeline frequency band must be finite".into(),
            ));
        }
        if self.freq_min < 0.0 || self.freq_min > self.freq_max {
            return Err(PulseError::Configuration(format!(
                "pipeline band must satisfy 0 <= freq_min <= freq_max (got {}..{})",
                self.freq_min, self.freq_max
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_fps(30.0)
    }
}

/// Peak-detection tuning for the HRV analyzer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HrvConfig {
    /// Minimum distance between accepted peaks, in seconds of the analyzed signal.
    #[serde(default = "HrvConfig::default_min_peak_separation_secs")]
    pub min_peak_separation_secs: f64,
    /// Local maxima at or below this magnitude are treated as noise.
    #[serde(default = "HrvConfig::default_peak_floor")]
    pub peak_floor: f64,
}

impl HrvConfig {
    fn default_min_peak_separation_secs() -> f64 {
        0.5
    }

    fn default_peak_floor() -> f64 {
        1e-9
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min_peak_separation_secs.is_finite() || self.min_peak_separation_secs < 0.0 {
            return Err(PulseError::Configuration(
                "hrv.min_peak_separation_secs must be a non-negative number".into(),
            ));
        }
        if !self.peak_floor.is_finite() || self.peak_floor < 0.0 {
            return Err(PulseError::Configuration(
                "hrv.peak_floor must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

impl Default for HrvConfig {
    fn default() -> Self {
        Self {
            min_peak_separation_secs: Self::default_min_peak_separation_secs(),
            peak_floor: Self::default_peak_floor(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpsConfig {
    pub log_level: String,
    pub report_dir: String,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            report_dir: "reports".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PulseConfig {
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub hrv: HrvConfig,
    #[serde(default)]
    pub ops: OpsConfig,
}

impl PulseConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| {
            PulseError::Configuration(format!(
                "unable to read config file {}: {err}",
                path_ref.display()
            ))
        })?;
        toml::from_str(&contents).map_err(|err| {
            PulseError::Configuration(format!(
                "failed to parse config file {}: {err}",
                path_ref.display()
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        self.hrv.validate()?;
        if self.ops.report_dir.trim().is_empty() {
            return Err(PulseError::Configuration(
                "ops.report_dir must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn load_pulse_config_from_file() {
        let temp_path = std::env::temp_dir().join("pulselens-config-test.toml");
        let config = PulseConfig {
            pipeline: PipelineConfig {
                batch_size: 64,
                target_resolution: (160, 120),
                fps: 25.0,
                freq_min: 0.8,
                freq_max: 3.5,
            },
            hrv: HrvConfig {
                min_peak_separation_secs: 0.4,
                peak_floor: 1e-6,
            },
            ops: OpsConfig {
                log_level: "debug".into(),
                report_dir: "out".into(),
            },
        };

        let doc = toml::to_string(&config).expect("serialize config");
        fs::write(&temp_path, doc).expect("write temp config");

        let loaded = PulseConfig::from_file(&temp_path).expect("load config");
        assert_eq!(loaded, config);
        fs::remove_file(&temp_path).expect("cleanup temp config");
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let doc = "[pipeline]\nfps = 30.0\n";
        let config: PulseConfig = toml::from_str(doc).expect("parse minimal config");
        assert_eq!(config.pipeline.batch_size, 100);
        assert_eq!(config.pipeline.target_resolution, (320, 240));
        assert_eq!(config.hrv, HrvConfig::default());
        assert_eq!(config.ops.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bundled_dev_config_is_valid() {
        let config: PulseConfig =
            toml::from_str(include_str!("../../../configs/dev.toml")).expect("parse dev config");
        assert_eq!(config.pipeline, PipelineConfig::with_fps(30.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unreadable_file_is_a_configuration_error() {
        let err = PulseConfig::from_file("/nonexistent/pulselens.toml").unwrap_err();
        assert!(matches!(err, PulseError::Configuration(_)));
    }

    #[test]
    fn validate_configuration_rules() {
        let mut config = PulseConfig::default();
        assert!(config.validate().is_ok());

        config.pipeline.batch_size = 0;
        assert!(config.validate().is_err());
        config.pipeline.batch_size = 100;
        config.pipeline.fps = 0.0;
        assert!(config.validate().is_err());
        config.pipeline.fps = f64::NAN;
        assert!(config.validate().is_err());
        config.pipeline.fps = 30.0;
        config.pipeline.target_resolution = (0, 240);
        assert!(config.validate().is_err());
        config.pipeline.target_resolution = (320, 240);
        config.pipeline.freq_min = 5.0;
        assert!(config.validate().is_err());
        config.pipeline.freq_min = -1.0;
        assert!(config.validate().is_err());
        config.pipeline.freq_min = 0.75;
        config.hrv.min_peak_separation_secs = -0.1;
        assert!(config.validate().is_err());
        config.hrv.min_peak_separation_secs = 0.5;
        config.hrv.peak_floor = -1.0;
        assert!(config.validate().is_err());
        config.hrv.peak_floor = 0.0;
        config.ops.report_dir = " ".into();
        assert!(config.validate().is_err());
        config.ops.report_dir = "reports".into();
        assert!(config.validate().is_ok());
    }
}
