// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera platform
//!
//! Plays a list of still images as a camera feed. Each image stays on screen
//! for a fixed hold time; playback either loops or ends after the last image,
//! after which the track produces no more frames. There is no native
//! detector and no torch, so the scanner runs its software path.
//!
//! ```text
//! image files ──► VideoFrame list ──► VirtualTrack (time-indexed)
//!                                          │
//!                                          ▼
//!                                     PreviewSink ──► software reader
//! ```

mod file_source;

pub use file_source::{load_frames, load_image_as_frame};

use crate::backends::camera::types::{
    BackendResult, MediaRequest, PlatformCapabilities, TrackCapabilities, TrackConstraintSet,
    VideoFrame,
};
use crate::backends::camera::{
    BarcodeDetector, CameraPlatform, FrameClock, FrameReader, IntervalFrameClock, MediaStream,
    VideoTrack,
};
use crate::constants::virtual_camera as vc;
use crate::errors::AcquisitionError;
use crate::frame_processor::BarcodeFormat;
use crate::frame_processor::tasks::QrReader;
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Still-image camera platform
#[derive(Debug, Clone)]
pub struct VirtualCamera {
    frames: Arc<[VideoFrame]>,
    frame_hold: Duration,
    looping: bool,
    refresh_hz: u32,
}

impl VirtualCamera {
    pub fn from_frames(frames: Vec<VideoFrame>) -> Self {
        Self {
            frames: frames.into(),
            frame_hold: vc::DEFAULT_FRAME_HOLD,
            looping: false,
            refresh_hz: vc::DEFAULT_REFRESH_HZ,
        }
    }

    /// Load image files (or directories of them) as the feed
    pub fn from_files(paths: &[PathBuf]) -> BackendResult<Self> {
        Ok(Self::from_frames(load_frames(paths)?))
    }

    pub fn with_frame_hold(mut self, hold: Duration) -> Self {
        // A zero hold would divide by zero when indexing frames
        self.frame_hold = hold.max(Duration::from_millis(1));
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_refresh_rate(mut self, refresh_hz: u32) -> Self {
        self.refresh_hz = refresh_hz.max(1);
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Time for one pass through every image
    pub fn playback_duration(&self) -> Duration {
        self.frame_hold * self.frames.len() as u32
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }
}

impl CameraPlatform for VirtualCamera {
    fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities::native()
    }

    fn get_user_media<'a>(
        &'a self,
        request: &'a MediaRequest,
    ) -> BoxFuture<'a, Result<Arc<dyn MediaStream>, AcquisitionError>> {
        Box::pin(async move {
            if self.frames.is_empty() {
                return Err(AcquisitionError::DeviceNotFound);
            }
            debug!(constraints = ?request.video, "Virtual camera ignores capture constraints");
            info!(
                frames = self.frames.len(),
                hold_ms = self.frame_hold.as_millis(),
                looping = self.looping,
                "Starting virtual camera stream"
            );
            let track = Arc::new(VirtualTrack {
                frames: Arc::clone(&self.frames),
                frame_hold: self.frame_hold,
                looping: self.looping,
                started: Instant::now(),
                live: AtomicBool::new(true),
            });
            Ok(Arc::new(VirtualStream { track }) as Arc<dyn MediaStream>)
        })
    }

    fn barcode_detector(&self, _formats: &[BarcodeFormat]) -> Option<Arc<dyn BarcodeDetector>> {
        None
    }

    fn software_reader(&self) -> Arc<dyn FrameReader> {
        Arc::new(QrReader::new())
    }

    fn frame_clock(&self) -> Arc<dyn FrameClock> {
        Arc::new(IntervalFrameClock::new(self.refresh_hz))
    }
}

struct VirtualStream {
    track: Arc<VirtualTrack>,
}

impl MediaStream for VirtualStream {
    fn tracks(&self) -> Vec<Arc<dyn VideoTrack>> {
        vec![Arc::clone(&self.track) as Arc<dyn VideoTrack>]
    }
}

/// Track that shows each image for `frame_hold`
pub struct VirtualTrack {
    frames: Arc<[VideoFrame]>,
    frame_hold: Duration,
    looping: bool,
    started: Instant,
    live: AtomicBool,
}

impl VirtualTrack {
    fn frame_index(&self, elapsed: Duration) -> Option<usize> {
        let index = (elapsed.as_millis() / self.frame_hold.as_millis().max(1)) as usize;
        if self.looping {
            Some(index % self.frames.len())
        } else if index < self.frames.len() {
            Some(index)
        } else {
            None
        }
    }
}

impl VideoTrack for VirtualTrack {
    fn label(&self) -> String {
        "Virtual camera".to_string()
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            debug!("Virtual camera track stopped");
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn capabilities(&self) -> TrackCapabilities {
        TrackCapabilities { torch: false }
    }

    fn apply_constraints<'a>(
        &'a self,
        _constraints: &'a TrackConstraintSet,
    ) -> BoxFuture<'a, Result<(), String>> {
        Box::pin(async { Err("Virtual camera has no adjustable controls".to_string()) })
    }

    fn latest_frame(&self) -> Option<VideoFrame> {
        if !self.is_live() {
            return None;
        }
        let index = self.frame_index(self.started.elapsed())?;
        let mut frame = self.frames[index].clone();
        frame.captured_at = Instant::now();
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::PixelFormat;

    fn frames(n: usize) -> Vec<VideoFrame> {
        (0..n)
            .map(|i| VideoFrame::new(2, 2, PixelFormat::Gray, vec![i as u8; 4]))
            .collect()
    }

    fn track(n: usize, looping: bool) -> VirtualTrack {
        VirtualTrack {
            frames: frames(n).into(),
            frame_hold: Duration::from_millis(100),
            looping,
            started: Instant::now(),
            live: AtomicBool::new(true),
        }
    }

    #[test]
    fn test_frame_index_one_pass() {
        let track = track(3, false);
        assert_eq!(track.frame_index(Duration::from_millis(0)), Some(0));
        assert_eq!(track.frame_index(Duration::from_millis(150)), Some(1));
        assert_eq!(track.frame_index(Duration::from_millis(299)), Some(2));
        assert_eq!(track.frame_index(Duration::from_millis(300)), None);
    }

    #[test]
    fn test_frame_index_looping() {
        let track = track(3, true);
        assert_eq!(track.frame_index(Duration::from_millis(300)), Some(0));
        assert_eq!(track.frame_index(Duration::from_millis(520)), Some(2));
    }

    #[test]
    fn test_stopped_track_has_no_frames() {
        let track = track(1, true);
        assert!(track.latest_frame().is_some());
        track.stop();
        track.stop();
        assert!(!track.is_live());
        assert!(track.latest_frame().is_none());
        assert!(!track.capabilities().torch);
    }

    #[tokio::test]
    async fn test_empty_camera_reports_no_device() {
        let camera = VirtualCamera::from_frames(Vec::new());
        let request = MediaRequest::video_only(Default::default());
        let result = camera.get_user_media(&request).await;
        assert!(matches!(result, Err(AcquisitionError::DeviceNotFound)));
    }

    #[test]
    fn test_playback_duration() {
        let camera = VirtualCamera::from_frames(frames(4)).with_frame_hold(Duration::from_millis(250));
        assert_eq!(camera.playback_duration(), Duration::from_secs(1));
        assert!(camera.barcode_detector(&[BarcodeFormat::QrCode]).is_none());
    }
}
