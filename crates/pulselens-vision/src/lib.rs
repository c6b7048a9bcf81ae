//! Frame reduction: downscale, grayscale and batch raw video frames.

use image::imageops::{self, FilterType};
use pulselens_types::{
    config::PipelineConfig,
    frame::{FrameBatch, GrayFrame, VideoFrame},
    PulseError, Result,
};
use tracing::debug;

mod source;

pub use source::{DirectoryFrameSource, FrameSource, MemoryFrameSource};

const MAX_CHANNEL_VALUE: f32 = 255.0;

// BT.601 luma weights in 14-bit fixed point (0.299, 0.587, 0.114); they sum to 1 << 14.
const LUMA_SHIFT: u32 = 14;
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;

/// Turns color frames into normalized grayscale frames grouped in batches.
#[derive(Debug, Clone, Copy)]
pub struct FrameReducer {
    batch_size: usize,
    target_resolution: (u32, u32),
}

impl FrameReducer {
    pub fn new(batch_size: usize, target_resolution: (u32, u32)) -> Result<Self> {
        if batch_size == 0 {
            return Err(PulseError::Input("batch size must be greater than zero".into()));
        }
        if target_resolution.0 == 0 || target_resolution.1 == 0 {
            return Err(PulseError::Input(format!(
                "target resolution must be non-zero (got {}x{})",
                target_resolution.0, target_resolution.1
            )));
        }
        Ok(Self {
            batch_size,
            target_resolution,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(config.batch_size, config.target_resolution)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Resize (area-weighted) → BT.601 grayscale → scale to [0, 1]. Consumes the frame.
    pub fn reduce_frame(&self, frame: VideoFrame) -> Result<GrayFrame> {
        if frame.width == 0 || frame.height == 0 {
            return Err(vision_error(format!(
                "cannot reduce empty frame ({}x{})",
                frame.width, frame.height
            )));
        }
        let (width, height) = self.target_resolution;
        let rgb = frame.into_rgb_image()?;
        let resized = if rgb.dimensions() == (width, height) {
            rgb
        } else {
            // Triangle support widens with the scale factor, averaging every covered source pixel.
            imageops::resize(&rgb, width, height, FilterType::Triangle)
        };
        let samples = resized
            .pixels()
            .map(|pixel| f32::from(luma(pixel.0)) / MAX_CHANNEL_VALUE)
            .collect();
        Ok(GrayFrame {
            width,
            height,
            samples,
        })
    }

    /// Lazily reduce `frames` into batches of `batch_size`; the last batch may be shorter.
    ///
    /// The returned iterator is forward-only and cannot be restarted: each raw
    /// frame is pulled from `frames` once and dropped after reduction. Collect
    /// the batches if more than one pass is needed.
    pub fn batches<I>(&self, frames: I) -> FrameBatches<I::IntoIter>
    where
        I: IntoIterator<Item = VideoFrame>,
    {
        FrameBatches {
            reducer: *self,
            frames: frames.into_iter(),
            emitted: 0,
            finished: false,
        }
    }
}

/// Rounded BT.601 luma of one RGB pixel.
fn luma([r, g, b]: [u8; 3]) -> u8 {
    let weighted = u32::from(r) * LUMA_R + u32::from(g) * LUMA_G + u32::from(b) * LUMA_B;
    let rounded = (weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT;
    u8::try_from(rounded).unwrap_or(u8::MAX)
}

/// Iterator returned by [`FrameReducer::batches`]. Stops after the first error.
pub struct FrameBatches<I> {
    reducer: FrameReducer,
    frames: I,
    emitted: usize,
    finished: bool,
}

impl<I> FrameBatches<I> {
    pub fn emitted(&self) -> usize {
        self.emitted
    }
}

impl<I> Iterator for FrameBatches<I>
where
    I: Iterator<Item = VideoFrame>,
{
    type Item = Result<FrameBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let mut batch = FrameBatch::with_capacity(self.reducer.batch_size);
        while batch.len() < self.reducer.batch_size {
            let Some(frame) = self.frames.next() else {
                self.finished = true;
                break;
            };
            match self.reducer.reduce_frame(frame) {
                Ok(reduced) => batch.push(reduced),
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
        if batch.is_empty() {
            return None;
        }
        self.emitted += 1;
        debug!("Emitting frame batch {} ({} frames)", self.emitted, batch.len());
        Some(Ok(batch))
    }
}

pub fn vision_error(message: impl Into<String>) -> PulseError {
    PulseError::Vision(message.into())
}
