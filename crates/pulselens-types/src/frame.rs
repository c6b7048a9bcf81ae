use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::{PulseError, Result};

/// Decoded color frame as delivered by a video source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Interleaved RGB8 pixel buffer, row-major.
    pub data: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

impl VideoFrame {
    pub const CHANNELS: usize = 3;

    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = (width as usize) * (height as usize) * Self::CHANNELS;
        if data.len() != expected {
            return Err(PulseError::Input(format!(
                "frame buffer holds {} bytes, expected {expected} for {width}x{height} RGB",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            captured_at: Utc::now(),
        })
    }

    /// Frame filled with a single color.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = (width as usize) * (height as usize);
        let data = rgb.iter().copied().cycle().take(pixels * Self::CHANNELS).collect();
        Self {
            width,
            height,
            data,
            captured_at: Utc::now(),
        }
    }

    pub fn from_rgb_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
            captured_at: Utc::now(),
        }
    }

    pub fn into_rgb_image(self) -> Result<RgbImage> {
        let (width, height) = (self.width, self.height);
        RgbImage::from_raw(width, height, self.data).ok_or_else(|| {
            PulseError::Input(format!(
                "frame buffer too small for {width}x{height} RGB image"
            ))
        })
    }
}

/// Single-channel intensity grid normalized to [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct GrayFrame {
    pub width: u32,
    pub height: u32,
    pub samples: Vec<f32>,
}

impl GrayFrame {
    /// Spatial mean intensity; 0 for an empty grid.
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|&s| f64::from(s)).sum();
        sum / self.samples.len() as f64
    }
}

/// Temporally ordered run of reduced frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameBatch {
    pub frames: Vec<GrayFrame>,
}

impl FrameBatch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn push(&mut self, frame: GrayFrame) {
        self.frames.push(frame);
    }

    /// One scalar per frame: the 1-D brightness signal of this batch.
    pub fn mean_signal(&self) -> Vec<f64> {
        self.frames.iter().map(GrayFrame::mean).collect()
    }
}
