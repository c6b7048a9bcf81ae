use serde::{Deserialize, Serialize};

/// Interval statistics derived from detected peaks.
///
/// `valid` is false when fewer than two RR intervals were available; the
/// numeric fields are then zero and must not be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct HrvMetrics {
    pub sdnn_ms: f64,
    pub rmssd_ms: f64,
    pub valid: bool,
}

impl HrvMetrics {
    pub const fn invalid() -> Self {
        Self {
            sdnn_ms: 0.0,
            rmssd_ms: 0.0,
            valid: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartRateResult {
    pub heart_rate_bpm: f64,
    pub hrv_metrics: HrvMetrics,
}

impl HeartRateResult {
    /// Outcome when no frequency bin fell inside the band.
    pub const fn undetected() -> Self {
        Self {
            heart_rate_bpm: 0.0,
            hrv_metrics: HrvMetrics::invalid(),
        }
    }
}

/// Pipeline output plus the amount of input that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub frame_count: usize,
    pub batch_count: usize,
    /// Whether any spectral bin fell inside the band.
    #[serde(default)]
    pub band_selected: bool,
    pub result: HeartRateResult,
}

impl PipelineReport {
    /// A zero reading still counts as a measurement when a band bin existed.
    pub fn detected(&self) -> bool {
        self.band_selected
    }
}
