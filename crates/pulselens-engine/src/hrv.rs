use pulselens_types::{config::HrvConfig, result::HrvMetrics};
use tracing::{debug, warn};

use crate::round_to;

/// Derives RR intervals from the peak structure of a signal and summarizes them.
///
/// The signal handed over by the estimator is the aggregated magnitude
/// spectrum, read as if it were a time series sampled at `sampling_rate`.
#[derive(Debug, Clone, Default)]
pub struct HrvAnalyzer {
    config: HrvConfig,
}

impl HrvAnalyzer {
    pub fn new(config: HrvConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, signal: &[f64], sampling_rate: f64) -> HrvMetrics {
        let intervals = self.rr_intervals(signal, sampling_rate);
        compute_metrics(&intervals)
    }

    /// Peak-to-peak spacings in milliseconds; empty when fewer than two peaks exist.
    pub fn rr_intervals(&self, signal: &[f64], sampling_rate: f64) -> Vec<f64> {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            warn!("Invalid sampling rate {sampling_rate} for HRV analysis");
            return Vec::new();
        }
        let distance = self.min_peak_distance(sampling_rate);
        let peaks = find_peaks(signal, distance, self.config.peak_floor);
        if peaks.len() < 2 {
            warn!("Not enough peaks detected for HRV analysis ({} found)", peaks.len());
            return Vec::new();
        }
        debug!("Detected {} peaks with min distance {distance}", peaks.len());
        let ms_per_sample = 1000.0 / sampling_rate;
        peaks
            .windows(2)
            .map(|pair| (pair[1] - pair[0]) as f64 * ms_per_sample)
            .collect()
    }

    fn min_peak_distance(&self, sampling_rate: f64) -> usize {
        ((self.config.min_peak_separation_secs * sampling_rate) as usize).max(1)
    }
}

/// SDNN (population) and RMSSD in milliseconds, rounded to two decimals.
pub fn compute_metrics(intervals: &[f64]) -> HrvMetrics {
    if intervals.len() < 2 {
        return HrvMetrics::invalid();
    }
    let count = intervals.len() as f64;
    let mean = intervals.iter().sum::<f64>() / count;
    let variance = intervals.iter().map(|rr| (rr - mean).powi(2)).sum::<f64>() / count;

    let successive: Vec<f64> = intervals.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let mean_square =
        successive.iter().map(|diff| diff * diff).sum::<f64>() / successive.len() as f64;

    HrvMetrics {
        sdnn_ms: round_to(variance.sqrt(), 2),
        rmssd_ms: round_to(mean_square.sqrt(), 2),
        valid: true,
    }
}

/// Indices of local maxima above `floor`, thinned so that accepted peaks are
/// at least `min_distance` samples apart. Taller peaks win; plateaus report
/// their middle sample and the first and last samples are never peaks.
pub fn find_peaks(signal: &[f64], min_distance: usize, floor: f64) -> Vec<usize> {
    let peaks: Vec<usize> = local_maxima(signal)
        .into_iter()
        .filter(|&idx| signal[idx] > floor)
        .collect();
    if min_distance <= 1 || peaks.len() < 2 {
        return peaks;
    }
    select_by_distance(signal, &peaks, min_distance)
}

fn local_maxima(signal: &[f64]) -> Vec<usize> {
    let mut maxima = Vec::new();
    if signal.len() < 3 {
        return maxima;
    }
    let last = signal.len() - 1;
    let mut i = 1;
    while i < last {
        if signal[i - 1] < signal[i] {
            let mut ahead = i + 1;
            while ahead < last && signal[ahead] == signal[i] {
                ahead += 1;
            }
            if signal[ahead] < signal[i] {
                maxima.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    maxima
}

fn select_by_distance(signal: &[f64], peaks: &[usize], min_distance: usize) -> Vec<usize> {
    let mut keep = vec![true; peaks.len()];
    let mut by_height: Vec<usize> = (0..peaks.len()).collect();
    by_height.sort_by(|&a, &b| signal[peaks[a]].total_cmp(&signal[peaks[b]]));

    for &current in by_height.iter().rev() {
        if !keep[current] {
            continue;
        }
        let position = peaks[current];
        for left in (0..current).rev() {
            if position - peaks[left] >= min_distance {
                break;
            }
            keep[left] = false;
        }
        for right in current + 1..peaks.len() {
            if peaks[right] - position >= min_distance {
                break;
            }
            keep[right] = false;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&peak, kept)| kept.then_some(peak))
        .collect()
}
