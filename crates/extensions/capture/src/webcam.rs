//! Local camera through `nokhwa`.
//!
//! The camera handle is pinned to one OS thread; the async stream talks to
//! it through a request channel.

use std::sync::mpsc as std_mpsc;
use std::thread;

use async_trait::async_trait;
use image::RgbImage;
use nokhwa::Camera;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use gesturecall_protocols::{CaptureConstraints, CaptureError, FrameData, VideoSource, VideoStream};

use crate::encode::{encode_data_url, fit_to};

pub struct WebcamSource {
    index: u32,
    quality: u8,
}

impl WebcamSource {
    pub fn new(index: u32, quality: u8) -> Self {
        Self { index, quality }
    }
}

type FrameReply = oneshot::Sender<Result<FrameData, CaptureError>>;

enum Request {
    Frame(FrameReply),
    Stop,
}

fn open_camera(index: u32, constraints: CaptureConstraints) -> Result<Camera, CaptureError> {
    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::HighestResolution(
        Resolution::new(constraints.width, constraints.height),
    ));
    let mut camera = Camera::new(CameraIndex::Index(index), requested)
        .map_err(|e| CaptureError::Unavailable(e.to_string()))?;
    camera
        .open_stream()
        .map_err(|e| CaptureError::Unavailable(e.to_string()))?;
    Ok(camera)
}

fn grab(camera: &mut Camera, constraints: CaptureConstraints, quality: u8) -> Result<FrameData, CaptureError> {
    let frame = camera
        .frame()
        .map_err(|e| CaptureError::FrameFailed(e.to_string()))?;
    let decoded = frame
        .decode_image::<RgbFormat>()
        .map_err(|e| CaptureError::FrameFailed(e.to_string()))?;
    let (width, height) = (decoded.width(), decoded.height());
    let image = RgbImage::from_raw(width, height, decoded.into_raw())
        .ok_or_else(|| CaptureError::FrameFailed("frame buffer size mismatch".to_string()))?;
    encode_data_url(&fit_to(image, constraints.width, constraints.height), quality)
}

fn camera_thread(
    mut camera: Camera,
    constraints: CaptureConstraints,
    quality: u8,
    requests: std_mpsc::Receiver<Request>,
) {
    while let Ok(request) = requests.recv() {
        match request {
            Request::Frame(reply) => {
                let _ = reply.send(grab(&mut camera, constraints, quality));
            }
            Request::Stop => break,
        }
    }
    if let Err(e) = camera.stop_stream() {
        warn!("Failed to stop camera stream: {}", e);
    }
    debug!("Camera thread exited");
}

#[async_trait]
impl VideoSource for WebcamSource {
    fn name(&self) -> &str {
        "webcam"
    }

    async fn open(&self, constraints: CaptureConstraints) -> Result<Box<dyn VideoStream>, CaptureError> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (tx, rx) = std_mpsc::channel();
        let index = self.index;
        let quality = self.quality;

        thread::Builder::new()
            .name(format!("gesturecall-camera-{}", index))
            .spawn(move || match open_camera(index, constraints) {
                Ok(camera) => {
                    let res = camera.resolution();
                    let _ = ready_tx.send(Ok((res.width(), res.height())));
                    camera_thread(camera, constraints, quality, rx);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| CaptureError::Unavailable(e.to_string()))?;

        let native = ready_rx
            .await
            .map_err(|_| CaptureError::Unavailable("camera thread exited".to_string()))??;
        info!(index, native_width = native.0, native_height = native.1, "Camera opened");

        Ok(Box::new(WebcamStream {
            requests: Some(tx),
            resolution: (constraints.width, constraints.height),
        }))
    }
}

struct WebcamStream {
    requests: Option<std_mpsc::Sender<Request>>,
    resolution: (u32, u32),
}

#[async_trait]
impl VideoStream for WebcamStream {
    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    async fn capture(&mut self) -> Result<FrameData, CaptureError> {
        let requests = self.requests.as_ref().ok_or(CaptureError::Released)?;
        let (reply_tx, reply_rx) = oneshot::channel();
        requests
            .send(Request::Frame(reply_tx))
            .map_err(|_| CaptureError::Released)?;
        reply_rx.await.map_err(|_| CaptureError::Released)?
    }

    async fn release(&mut self) {
        if let Some(requests) = self.requests.take() {
            let _ = requests.send(Request::Stop);
            info!("Camera released");
        }
    }
}

impl Drop for WebcamStream {
    fn drop(&mut self) {
        if let Some(requests) = self.requests.take() {
            let _ = requests.send(Request::Stop);
        }
    }
}
