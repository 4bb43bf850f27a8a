// SPDX-License-Identifier: GPL-3.0-only

//! Decode strategies
//!
//! A strategy turns the frame currently shown by the video sink into at most
//! one barcode. The native strategy wraps a platform detector and swallows
//! per-frame errors; the software strategy wraps a one-shot reader and
//! surfaces real decode failures while ignoring "not found".

use crate::backends::camera::{BarcodeDetector, CameraPlatform, FrameReader, VideoSink};
use crate::errors::ReadError;
use crate::frame_processor::{BarcodeFormat, DecodedBarcode};
use futures::future::BoxFuture;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Which decode path a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Platform accelerated detector
    Native,
    /// Software reader fallback
    Software,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Native => write!(f, "native"),
            StrategyKind::Software => write!(f, "software"),
        }
    }
}

/// Result of one frame step
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// The sink has no decoded frame yet
    NotReady,
    /// Frame processed, nothing to report
    NoCode,
    /// A non-empty payload
    Hit(DecodedBarcode),
    /// Decode failure worth showing to the user
    Failed(String),
}

pub trait DecodeStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Process the frame currently shown by `sink`
    fn scan<'a>(&'a self, sink: &'a dyn VideoSink) -> BoxFuture<'a, FrameOutcome>;
}

/// Pick the strategy once, from the platform capability probe
pub fn select(platform: &dyn CameraPlatform, formats: &[BarcodeFormat]) -> Box<dyn DecodeStrategy> {
    match platform.barcode_detector(formats) {
        Some(detector) => {
            debug!(formats = formats.len(), "Native barcode detector available");
            Box::new(NativeStrategy::new(detector))
        }
        None => {
            debug!("No native barcode detector, using software reader");
            Box::new(SoftwareStrategy::new(platform.software_reader()))
        }
    }
}

pub struct NativeStrategy {
    detector: Arc<dyn BarcodeDetector>,
}

impl NativeStrategy {
    pub fn new(detector: Arc<dyn BarcodeDetector>) -> Self {
        Self { detector }
    }
}

impl DecodeStrategy for NativeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Native
    }

    fn scan<'a>(&'a self, sink: &'a dyn VideoSink) -> BoxFuture<'a, FrameOutcome> {
        Box::pin(async move {
            let Some(frame) = sink.current_frame().filter(|f| f.has_dimensions()) else {
                return FrameOutcome::NotReady;
            };
            match self.detector.detect(&frame).await {
                Ok(codes) => match codes.into_iter().next() {
                    Some(first) if !first.text.is_empty() => FrameOutcome::Hit(first),
                    _ => FrameOutcome::NoCode,
                },
                Err(e) => {
                    // Transient; reporting every frame would flood the caller
                    trace!(error = %e, "Native detection failed for frame");
                    FrameOutcome::NoCode
                }
            }
        })
    }
}

pub struct SoftwareStrategy {
    reader: Arc<dyn FrameReader>,
}

impl SoftwareStrategy {
    pub fn new(reader: Arc<dyn FrameReader>) -> Self {
        Self { reader }
    }
}

impl DecodeStrategy for SoftwareStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Software
    }

    fn scan<'a>(&'a self, sink: &'a dyn VideoSink) -> BoxFuture<'a, FrameOutcome> {
        Box::pin(async move {
            let Some(frame) = sink.current_frame() else {
                return FrameOutcome::NotReady;
            };
            match self.reader.decode(frame).await {
                Ok(decoded) if !decoded.text.is_empty() => FrameOutcome::Hit(decoded),
                Ok(_) | Err(ReadError::NotFound) => FrameOutcome::NoCode,
                Err(ReadError::Failed(message)) => FrameOutcome::Failed(message),
            }
        })
    }
}
