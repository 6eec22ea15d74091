//! Directory replay source.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbImage;
use tracing::{debug, info};

use gesturecall_protocols::{CaptureConstraints, CaptureError, FrameData, VideoSource, VideoStream};

use crate::encode::{encode_data_url, fit_to};

const EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Plays the images of a directory in name order, looping forever.
///
/// Stands in for a camera on machines without one and in recorded demos.
pub struct ReplaySource {
    dir: PathBuf,
    quality: u8,
}

impl ReplaySource {
    pub fn new(dir: impl Into<PathBuf>, quality: u8) -> Self {
        Self {
            dir: dir.into(),
            quality,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, CaptureError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| CaptureError::Unavailable(format!("{}: {}", dir.display(), e)))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

fn load_frames(dir: &Path, constraints: CaptureConstraints, quality: u8) -> Result<Vec<FrameData>, CaptureError> {
    let paths = list_images(dir)?;
    if paths.is_empty() {
        return Err(CaptureError::Unavailable(format!("no images in {}", dir.display())));
    }

    let mut frames = Vec::with_capacity(paths.len());
    for path in &paths {
        let image: RgbImage = image::open(path)
            .map_err(|e| CaptureError::FrameFailed(format!("{}: {}", path.display(), e)))?
            .to_rgb8();
        let image = fit_to(image, constraints.width, constraints.height);
        frames.push(encode_data_url(&image, quality)?);
    }
    Ok(frames)
}

#[async_trait]
impl VideoSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    async fn open(&self, constraints: CaptureConstraints) -> Result<Box<dyn VideoStream>, CaptureError> {
        let dir = self.dir.clone();
        let quality = self.quality;
        let frames = tokio::task::spawn_blocking(move || load_frames(&dir, constraints, quality))
            .await
            .map_err(|e| CaptureError::Unavailable(e.to_string()))??;

        info!(dir = %self.dir.display(), frames = frames.len(), "Replay source opened");
        Ok(Box::new(ReplayStream {
            frames: Arc::new(frames),
            next: 0,
            resolution: (constraints.width, constraints.height),
            released: false,
        }))
    }
}

struct ReplayStream {
    frames: Arc<Vec<FrameData>>,
    next: usize,
    resolution: (u32, u32),
    released: bool,
}

#[async_trait]
impl VideoStream for ReplayStream {
    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    async fn capture(&mut self) -> Result<FrameData, CaptureError> {
        if self.released {
            return Err(CaptureError::Released);
        }
        let frame = self.frames[self.next % self.frames.len()].clone();
        self.next = self.next.wrapping_add(1);
        Ok(frame)
    }

    async fn release(&mut self) {
        if !self.released {
            self.released = true;
            debug!("Replay stream released");
        }
    }
}
