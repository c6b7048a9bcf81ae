use pulselens_types::{
    config::{HrvConfig, PipelineConfig},
    result::{HeartRateResult, HrvMetrics},
    spectrum::AggregatedSpectrum,
    Result,
};
use tracing::{info, warn};

use crate::{engine_error, hrv::HrvAnalyzer, round_to};

/// Picks the dominant in-band frequency and hands the magnitudes to the HRV analyzer.
#[derive(Debug, Clone)]
pub struct HeartRateEstimator {
    freq_min: f64,
    freq_max: f64,
    analyzer: HrvAnalyzer,
}

impl HeartRateEstimator {
    pub fn new(freq_min: f64, freq_max: f64, hrv: HrvConfig) -> Result<Self> {
        if !freq_min.is_finite() || !freq_max.is_finite() || freq_min > freq_max {
            return Err(engine_error(format!(
                "invalid heart-rate band {freq_min}..{freq_max} Hz"
            )));
        }
        Ok(Self {
            freq_min,
            freq_max,
            analyzer: HrvAnalyzer::new(hrv),
        })
    }

    pub fn from_config(pipeline: &PipelineConfig, hrv: &HrvConfig) -> Result<Self> {
        Self::new(pipeline.freq_min, pipeline.freq_max, hrv.clone())
    }

    /// Estimate BPM (one decimal) and HRV from the aggregated spectrum.
    ///
    /// An empty band selection is a normal outcome and yields
    /// [`HeartRateResult::undetected`].
    pub fn estimate(&self, spectrum: &AggregatedSpectrum) -> HeartRateResult {
        let magnitudes = spectrum.magnitudes();
        let frequencies = spectrum.frequencies();

        let Some(peak) = self.dominant_index(&magnitudes, frequencies) else {
            info!(
                "No spectral bins within {}..{} Hz; heart rate undetected",
                self.freq_min, self.freq_max
            );
            return HeartRateResult::undetected();
        };
        let heart_rate_bpm = round_to(frequencies[peak] * 60.0, 1);

        let hrv_metrics = match effective_sampling_rate(frequencies) {
            Some(sampling_rate) => self.analyzer.analyze(&magnitudes, sampling_rate),
            None => {
                warn!("Frequency axis too short to derive a sampling rate; skipping HRV");
                HrvMetrics::invalid()
            }
        };
        info!(
            "Estimated heart rate {heart_rate_bpm} BPM (hrv valid: {})",
            hrv_metrics.valid
        );

        HeartRateResult {
            heart_rate_bpm,
            hrv_metrics,
        }
    }

    /// Whether any entry of the axis lies in the closed band.
    pub fn selects_band(&self, spectrum: &AggregatedSpectrum) -> bool {
        spectrum
            .frequencies()
            .iter()
            .any(|&freq| self.in_band(freq))
    }

    fn in_band(&self, freq: f64) -> bool {
        freq >= self.freq_min && freq <= self.freq_max
    }

    /// First index of the largest magnitude whose frequency lies in the closed band.
    fn dominant_index(&self, magnitudes: &[f64], frequencies: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, (&magnitude, &freq)) in magnitudes.iter().zip(frequencies).enumerate() {
            if !self.in_band(freq) {
                continue;
            }
            match best {
                Some((_, top)) if magnitude <= top => {}
                _ => best = Some((idx, magnitude)),
            }
        }
        best.map(|(idx, _)| idx)
    }
}

/// Reciprocal of the spacing between the first two axis entries.
///
/// The aggregated axis is piecewise, so this only reflects the first batch;
/// `None` when there are fewer than two entries or the spacing is not positive.
pub fn effective_sampling_rate(frequencies: &[f64]) -> Option<f64> {
    let [first, second, ..] = frequencies else {
        return None;
    };
    let spacing = second - first;
    (spacing.is_finite() && spacing > 0.0).then(|| 1.0 / spacing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;
    use pulselens_types::spectrum::SpectralBand;

    fn band(mags: &[f64], freqs: &[f64]) -> SpectralBand {
        SpectralBand::new(
            mags.iter().map(|&m| Complex64::new(0.0, m)).collect(),
            freqs.to_vec(),
        )
        .expect("band")
    }

    fn spectrum(bands: Vec<SpectralBand>) -> AggregatedSpectrum {
        AggregatedSpectrum::from_bands(bands)
    }

    fn estimator() -> HeartRateEstimator {
        HeartRateEstimator::new(0.75, 4.0, HrvConfig::default()).expect("estimator")
    }

    #[test]
    fn rejects_inverted_band() {
        assert!(HeartRateEstimator::new(4.0, 0.75, HrvConfig::default()).is_err());
        assert!(HeartRateEstimator::new(f64::NAN, 4.0, HrvConfig::default()).is_err());
    }

    #[test]
    fn empty_band_selection_is_undetected() {
        let result = estimator().estimate(&spectrum(vec![band(&[5.0, 1.0], &[0.0, 0.5])]));
        assert_eq!(result, HeartRateResult::undetected());
        assert_eq!(
            estimator().estimate(&AggregatedSpectrum::new()),
            HeartRateResult::undetected()
        );
    }

    #[test]
    fn dominant_in_band_frequency_sets_bpm() {
        let result = estimator().estimate(&spectrum(vec![band(
            &[9.0, 1.0, 6.0, 2.0, 8.0],
            &[0.0, 0.9, 1.2, 1.5, -1.2],
        )]));
        assert_eq!(result.heart_rate_bpm, 72.0);
    }

    #[test]
    fn band_edges_are_inclusive_and_ties_keep_the_first() {
        let result = estimator().estimate(&spectrum(vec![band(
            &[0.0, 3.0, 3.0],
            &[0.0, 0.75, 4.0],
        )]));
        assert_eq!(result.heart_rate_bpm, 45.0);
    }

    #[test]
    fn searches_across_every_batch() {
        let result = estimator().estimate(&spectrum(vec![
            band(&[0.0, 2.0, 0.0], &[0.0, 1.0, -1.0]),
            band(&[0.0, 7.0, 0.0], &[0.0, 1.5, -1.5]),
        ]));
        assert_eq!(result.heart_rate_bpm, 90.0);
    }

    #[test]
    fn dc_bin_counts_as_a_band_selection() {
        let dc_band = HeartRateEstimator::new(0.0, 4.0, HrvConfig::default()).expect("estimator");
        let dc_heavy = spectrum(vec![band(&[9.0, 1.0], &[0.0, 1.0])]);
        assert!(dc_band.selects_band(&dc_heavy));
        assert_eq!(dc_band.estimate(&dc_heavy).heart_rate_bpm, 0.0);
        assert!(!estimator().selects_band(&spectrum(vec![band(&[9.0], &[0.0])])));
        assert!(!estimator().selects_band(&AggregatedSpectrum::new()));
    }

    #[test]
    fn sampling_rate_comes_from_first_spacing() {
        let rate = effective_sampling_rate(&[0.0, 0.25, 0.5, -0.5]).expect("rate");
        assert!((rate - 4.0).abs() < 1e-12);
        assert_eq!(effective_sampling_rate(&[0.0]), None);
        assert_eq!(effective_sampling_rate(&[0.0, -1.0]), None);
    }

    #[test]
    fn short_axis_still_reports_bpm_with_invalid_hrv() {
        let result = estimator().estimate(&spectrum(vec![band(&[4.0], &[1.0])]));
        assert_eq!(result.heart_rate_bpm, 60.0);
        assert!(!result.hrv_metrics.valid);
    }

    #[test]
    fn hrv_uses_the_full_magnitude_spectrum() {
        // Spacing 1.0 Hz → sampling rate 1.0, minimum distance 1 sample.
        let mags = [0.0, 5.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 3.0, 0.0];
        let freqs = [0.0, 1.0, 2.0, 3.0, 4.0, -5.0, -4.0, -3.0, -2.0, -1.0];
        let result = estimator().estimate(&spectrum(vec![band(&mags, &freqs)]));
        assert_eq!(result.heart_rate_bpm, 60.0);
        assert!(result.hrv_metrics.valid);
        // Peaks at 1, 4, 8 → intervals 3000 ms and 4000 ms.
        assert_eq!(result.hrv_metrics.sdnn_ms, 500.0);
        assert_eq!(result.hrv_metrics.rmssd_ms, 1000.0);
    }
}
