//! Heart-rate estimation and HRV analysis over aggregated spectra.

mod heart_rate;
mod hrv;

pub use heart_rate::{effective_sampling_rate, HeartRateEstimator};
pub use hrv::{compute_metrics, find_peaks, HrvAnalyzer};

use pulselens_types::PulseError;

/// Round to `decimals` places, ties to even.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

pub fn engine_error(message: impl Into<String>) -> PulseError {
    PulseError::Engine(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_requested_precision() {
        assert_eq!(round_to(72.04, 1), 72.0);
        assert_eq!(round_to(71.96, 1), 72.0);
        assert_eq!(round_to(12.4721, 2), 12.47);
        assert_eq!(round_to(0.0, 2), 0.0);
    }
}
