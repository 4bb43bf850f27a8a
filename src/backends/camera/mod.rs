// SPDX-License-Identifier: GPL-3.0-only

//! Camera platform abstraction
//!
//! The scanner never touches a device directly. Everything it needs from the
//! host (camera API, stream, tracks, preview surface, native detector,
//! display refresh signal) comes through the traits in this module, so the
//! controller logic runs the same against a browser bridge, a native camera
//! stack, the still-image virtual camera, or a scripted test double.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  ScannerController   │  ← Lifecycle, debounce, torch
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │ CameraPlatform trait │  ← Capability probe, stream acquisition
//! └──────────┬───────────┘
//!            │
//!     ┌──────┴──────┐
//!     ▼             ▼
//! MediaStream   VideoSink      BarcodeDetector / FrameReader / FrameClock
//! └ VideoTrack
//! ```

pub mod frame_loop;
pub mod preview;
pub mod types;

pub use frame_loop::{FrameClock, FrameLoopController, IntervalFrameClock, LoopAction, LoopToken};
pub use preview::PreviewSink;
pub use types::*;

use crate::errors::{AcquisitionError, DetectError, ReadError};
use crate::frame_processor::{BarcodeFormat, DecodedBarcode};
use futures::future::BoxFuture;
use std::sync::Arc;

/// Host environment the scanner runs in
pub trait CameraPlatform: Send + Sync {
    /// Probe which camera capabilities the runtime exposes
    fn capabilities(&self) -> PlatformCapabilities;

    /// Request a media stream matching the constraints
    fn get_user_media<'a>(
        &'a self,
        request: &'a MediaRequest,
    ) -> BoxFuture<'a, Result<Arc<dyn MediaStream>, AcquisitionError>>;

    /// Construct the accelerated detector, if the platform has one
    ///
    /// Returning `None` selects the software decode path.
    fn barcode_detector(&self, formats: &[BarcodeFormat]) -> Option<Arc<dyn BarcodeDetector>>;

    /// Software decoder used when no native detector exists
    fn software_reader(&self) -> Arc<dyn FrameReader>;

    /// Display refresh signal pacing the frame loop
    fn frame_clock(&self) -> Arc<dyn FrameClock>;
}

/// An acquired camera stream
pub trait MediaStream: Send + Sync {
    /// Every track of the stream
    fn tracks(&self) -> Vec<Arc<dyn VideoTrack>>;

    /// Video tracks only; the scanner never requests audio, so by default
    /// this is all tracks
    fn video_tracks(&self) -> Vec<Arc<dyn VideoTrack>> {
        self.tracks()
    }
}

/// A single live track
pub trait VideoTrack: Send + Sync {
    /// Human readable device label
    fn label(&self) -> String {
        String::new()
    }

    /// Stop the track and release the device; must never panic
    fn stop(&self);

    /// False once the track has been stopped or the device went away
    fn is_live(&self) -> bool;

    fn capabilities(&self) -> TrackCapabilities;

    fn apply_constraints<'a>(
        &'a self,
        constraints: &'a TrackConstraintSet,
    ) -> BoxFuture<'a, Result<(), String>>;

    /// Most recent frame produced by the device
    fn latest_frame(&self) -> Option<VideoFrame>;
}

/// Drawable video surface the stream is attached to
pub trait VideoSink: Send + Sync {
    /// Attach a stream, or detach with `None`
    fn attach(&self, stream: Option<Arc<dyn MediaStream>>);

    /// Begin playback of the attached stream
    fn play(&self) -> BoxFuture<'_, Result<(), String>>;

    /// Frame currently shown, `None` until playback produced one
    fn current_frame(&self) -> Option<VideoFrame>;
}

/// Native accelerated barcode detector
pub trait BarcodeDetector: Send + Sync {
    fn detect<'a>(
        &'a self,
        frame: &'a VideoFrame,
    ) -> BoxFuture<'a, Result<Vec<DecodedBarcode>, DetectError>>;
}

/// Software one-shot decoder
pub trait FrameReader: Send + Sync {
    /// Decode a single frame; `ReadError::NotFound` when it holds no code
    fn decode(&self, frame: VideoFrame) -> BoxFuture<'_, Result<DecodedBarcode, ReadError>>;
}
