//! Blocking pipeline entry point: reduce → filter → estimate.

use pulselens_engine::HeartRateEstimator;
use pulselens_spectral::SpectralFilter;
use pulselens_types::{
    config::{HrvConfig, PipelineConfig, PulseConfig},
    frame::VideoFrame,
    result::PipelineReport,
    spectrum::AggregatedSpectrum,
    PulseError, Result,
};
use pulselens_vision::FrameReducer;
use tracing::info;

/// Owns one configured instance of every stage. Not shared across threads;
/// callers wanting cancellation stop feeding frames between batches.
pub struct Pipeline {
    reducer: FrameReducer,
    filter: SpectralFilter,
    estimator: HeartRateEstimator,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig, hrv: &HrvConfig) -> Result<Self> {
        config.validate()?;
        hrv.validate()?;
        Ok(Self {
            reducer: FrameReducer::from_config(config)?,
            filter: SpectralFilter::from_config(config)?,
            estimator: HeartRateEstimator::from_config(config, hrv)?,
        })
    }

    pub fn from_config(config: &PulseConfig) -> Result<Self> {
        Self::new(&config.pipeline, &config.hrv)
    }

    /// Reduce and filter `frames` batch by batch. Returns the aggregated
    /// spectrum and the number of frames consumed.
    pub fn extract_spectrum<I>(&mut self, frames: I) -> Result<(AggregatedSpectrum, usize)>
    where
        I: IntoIterator<Item = VideoFrame>,
    {
        let mut frame_count = 0usize;
        let counted = frames.into_iter().inspect(|_| frame_count += 1);
        let aggregated = self.filter.filter_all(self.reducer.batches(counted))?;
        Ok((aggregated, frame_count))
    }

    pub fn run<I>(&mut self, frames: I) -> Result<PipelineReport>
    where
        I: IntoIterator<Item = VideoFrame>,
    {
        let (spectrum, frame_count) = self.extract_spectrum(frames)?;
        if spectrum.is_empty() {
            return Err(PulseError::Input("no frames supplied".into()));
        }
        let batch_count = spectrum.batch_count();
        info!("Filtered {frame_count} frames in {batch_count} batches");
        let band_selected = self.estimator.selects_band(&spectrum);
        let result = self.estimator.estimate(&spectrum);
        Ok(PipelineReport {
            frame_count,
            batch_count,
            band_selected,
            result,
        })
    }
}

/// One-shot convenience over [`Pipeline`].
pub fn find_heart_rate<I>(frames: I, config: &PulseConfig) -> Result<PipelineReport>
where
    I: IntoIterator<Item = VideoFrame>,
{
    Pipeline::from_config(config)?.run(frames)
}
