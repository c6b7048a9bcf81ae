use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pulselens_types::{frame::VideoFrame, PulseError, Result};
use tracing::{debug, info};

use crate::vision_error;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Supplies the ordered frame sequence the pipeline consumes.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn load_frames(&self) -> Result<Vec<VideoFrame>>;
}

/// Reads every image file of a directory, ordered by file name.
pub struct DirectoryFrameSource {
    dir: PathBuf,
}

impl DirectoryFrameSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn frame_paths(&self) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|err| {
            vision_error(format!("cannot list frame directory {:?}: {err}", self.dir))
        })?;
        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| vision_error(format!("cannot read directory entry: {err}")))?
        {
            let path = entry.path();
            if is_image_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

#[async_trait]
impl FrameSource for DirectoryFrameSource {
    async fn load_frames(&self) -> Result<Vec<VideoFrame>> {
        let paths = self.frame_paths().await?;
        if paths.is_empty() {
            return Err(PulseError::Input(format!(
                "no image frames found in {:?}",
                self.dir
            )));
        }
        let mut frames = Vec::with_capacity(paths.len());
        for path in &paths {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|err| vision_error(format!("cannot read frame {:?}: {err}", path)))?;
            let decoded = image::load_from_memory(&bytes)
                .map_err(|err| vision_error(format!("cannot decode frame {:?}: {err}", path)))?;
            debug!("Loaded frame {:?}", path);
            frames.push(VideoFrame::from_rgb_image(decoded.to_rgb8()));
        }
        info!("Loaded {} frames from {:?}", frames.len(), self.dir);
        Ok(frames)
    }
}

/// Frames already decoded by the caller.
#[derive(Clone, Default)]
pub struct MemoryFrameSource {
    frames: Vec<VideoFrame>,
}

impl MemoryFrameSource {
    pub fn new(frames: Vec<VideoFrame>) -> Self {
        Self { frames }
    }
}

#[async_trait]
impl FrameSource for MemoryFrameSource {
    async fn load_frames(&self) -> Result<Vec<VideoFrame>> {
        Ok(self.frames.clone())
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}
