use num_complex::Complex64;

use crate::{PulseError, Result};

/// Band-limited spectrum of one batch together with its DFT frequency axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralBand {
    spectrum: Vec<Complex64>,
    frequencies: Vec<f64>,
}

impl SpectralBand {
    pub fn new(spectrum: Vec<Complex64>, frequencies: Vec<f64>) -> Result<Self> {
        if spectrum.len() != frequencies.len() {
            return Err(PulseError::Spectral(format!(
                "spectrum has {} bins but frequency axis has {}",
                spectrum.len(),
                frequencies.len()
            )));
        }
        Ok(Self {
            spectrum,
            frequencies,
        })
    }

    pub fn spectrum(&self) -> &[Complex64] {
        &self.spectrum
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn len(&self) -> usize {
        self.spectrum.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectrum.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Complex64>, Vec<f64>) {
        (self.spectrum, self.frequencies)
    }
}

/// Per-batch spectra concatenated in batch order.
///
/// This is not one coherent transform of the whole signal: the frequency
/// axis restarts at every batch boundary and is only piecewise monotonic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedSpectrum {
    spectrum: Vec<Complex64>,
    frequencies: Vec<f64>,
    batch_lengths: Vec<usize>,
}

impl AggregatedSpectrum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bands<I>(bands: I) -> Self
    where
        I: IntoIterator<Item = SpectralBand>,
    {
        let mut aggregated = Self::new();
        for band in bands {
            aggregated.push(band);
        }
        aggregated
    }

    pub fn push(&mut self, band: SpectralBand) {
        let (spectrum, frequencies) = band.into_parts();
        self.batch_lengths.push(spectrum.len());
        self.spectrum.extend(spectrum);
        self.frequencies.extend(frequencies);
    }

    pub fn spectrum(&self) -> &[Complex64] {
        &self.spectrum
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Length of each contributing batch, in order.
    pub fn batch_lengths(&self) -> &[usize] {
        &self.batch_lengths
    }

    pub fn batch_count(&self) -> usize {
        self.batch_lengths.len()
    }

    pub fn len(&self) -> usize {
        self.spectrum.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectrum.is_empty()
    }

    pub fn magnitudes(&self) -> Vec<f64> {
        self.spectrum.iter().map(|bin| bin.norm()).collect()
    }
}
