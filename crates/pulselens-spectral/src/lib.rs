//! Temporal band-pass filtering of batch brightness signals in the frequency domain.

use std::ops::Range;

use num_complex::Complex64;
use pulselens_types::{
    config::PipelineConfig,
    frame::FrameBatch,
    spectrum::{AggregatedSpectrum, SpectralBand},
    PulseError, Result,
};
use rustfft::FftPlanner;
use tracing::debug;

/// Per-batch FFT filter keeping only `[freq_min, freq_max]` and its negative mirror.
pub struct SpectralFilter {
    fps: f64,
    freq_min: f64,
    freq_max: f64,
    planner: FftPlanner<f64>,
}

impl SpectralFilter {
    pub fn new(fps: f64, freq_min: f64, freq_max: f64) -> Result<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(PulseError::Input(format!(
                "frame rate must be positive (got {fps})"
            )));
        }
        if !freq_min.is_finite() || !freq_max.is_finite() {
            return Err(PulseError::Input("frequency band must be finite".into()));
        }
        Ok(Self {
            fps,
            freq_min,
            freq_max,
            planner: FftPlanner::new(),
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(config.fps, config.freq_min, config.freq_max)
    }

    /// Transform the batch's mean-brightness signal and zero every out-of-band bin.
    pub fn filter(&mut self, batch: &FrameBatch) -> Result<SpectralBand> {
        if batch.is_empty() {
            return Err(spectral_error("cannot filter an empty batch"));
        }
        let n = batch.len();
        let mut spectrum: Vec<Complex64> = batch
            .mean_signal()
            .into_iter()
            .map(|mean| Complex64::new(mean, 0.0))
            .collect();
        self.planner.plan_fft_forward(n).process(&mut spectrum);

        let frequencies = fft_frequencies(n, self.fps);
        let low = nearest_index(&frequencies, self.freq_min);
        let high = nearest_index(&frequencies, self.freq_max);
        debug!("Batch of {n} frames: band bins low={low} high={high}");
        band_limit(&mut spectrum, low, high);

        SpectralBand::new(spectrum, frequencies)
    }

    /// Filter every batch independently and concatenate the results in order.
    pub fn filter_all<I>(&mut self, batches: I) -> Result<AggregatedSpectrum>
    where
        I: IntoIterator<Item = Result<FrameBatch>>,
    {
        let mut aggregated = AggregatedSpectrum::new();
        for batch in batches {
            let band = self.filter(&batch?)?;
            aggregated.push(band);
        }
        Ok(aggregated)
    }
}

/// Concatenate independently filtered bands; no windowing, overlap or renormalization.
pub fn aggregate<I>(bands: I) -> AggregatedSpectrum
where
    I: IntoIterator<Item = SpectralBand>,
{
    AggregatedSpectrum::from_bands(bands)
}

/// Sample frequencies of an `n`-point DFT in standard order:
/// non-negative frequencies first, then the negative ones ascending.
pub fn fft_frequencies(n: usize, fps: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let step = 1.0 / (n as f64 * (1.0 / fps));
    let positive = (n - 1) / 2 + 1;
    (0..n)
        .map(|k| {
            let signed = if k < positive {
                k as f64
            } else {
                k as f64 - n as f64
            };
            signed * step
        })
        .collect()
}

/// First index whose frequency is closest to `target`; 0 for an empty axis.
pub fn nearest_index(frequencies: &[f64], target: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (idx, freq) in frequencies.iter().enumerate() {
        let distance = (freq - target).abs();
        if distance < best_distance {
            best = idx;
            best_distance = distance;
        }
    }
    best
}

/// Zero `[0, low)`, the mirror `[n - low, n)` and the centre `[high, n - high)`.
///
/// The mirror of index 0 is `n`, so `low == 0` zeroes no tail and `high == 0`
/// zeroes everything. Bounds are clamped to the spectrum and never wrap.
pub fn band_limit(spectrum: &mut [Complex64], low: usize, high: usize) {
    let n = spectrum.len();
    let low = low.min(n);
    let high = high.min(n);
    for range in [0..low, mirror(low, n)..n, high..mirror(high, n)] {
        zero(spectrum, range);
    }
}

fn mirror(idx: usize, n: usize) -> usize {
    n - idx.min(n)
}

fn zero(spectrum: &mut [Complex64], range: Range<usize>) {
    if range.start >= range.end {
        return;
    }
    spectrum[range]
        .iter_mut()
        .for_each(|bin| *bin = Complex64::new(0.0, 0.0));
}

pub fn spectral_error(message: impl Into<String>) -> PulseError {
    PulseError::Spectral(message.into())
}
