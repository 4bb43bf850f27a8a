// SPDX-License-Identifier: GPL-3.0-only

//! Mutable session state owned by a scanner controller

use super::debounce::Debouncer;
use super::strategy::StrategyKind;
use crate::backends::camera::{FrameLoopController, LoopToken, MediaStream, VideoSink};
use crate::frame_processor::ScanResult;
use std::sync::Arc;
use tracing::debug;

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScannerPhase {
    #[default]
    Idle,
    /// Inside `start()`, waiting for the camera or playback
    Starting,
    Active(StrategyKind),
}

/// Snapshot of everything a UI renders
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerStatus {
    pub phase: ScannerPhase,
    pub strategy: Option<StrategyKind>,
    pub is_active: bool,
    pub last_result: Option<ScanResult>,
    pub error: Option<String>,
}

pub(crate) struct SessionState {
    pub phase: ScannerPhase,
    /// Liveness token of the current start attempt and its frame loop
    pub token: LoopToken,
    pub stream: Option<Arc<dyn MediaStream>>,
    pub frame_loop: Option<FrameLoopController>,
    pub debouncer: Debouncer,
    pub last_result: Option<ScanResult>,
    pub error: Option<String>,
}

impl SessionState {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            phase: ScannerPhase::Idle,
            token: LoopToken::new(),
            stream: None,
            frame_loop: None,
            debouncer: Debouncer::new(debounce_ms),
            last_result: None,
            error: None,
        }
    }

    /// Nothing left to release
    pub fn is_released(&self) -> bool {
        self.stream.is_none() && self.frame_loop.is_none()
    }

    /// Invalidate the session and hand its resources to the caller
    ///
    /// Runs under the session lock so no continuation can observe a live
    /// token after this returns; the actual release happens outside it.
    pub fn teardown(&mut self) -> ReleasedSession {
        self.token.stop();
        self.phase = ScannerPhase::Idle;
        ReleasedSession {
            stream: self.stream.take(),
            frame_loop: self.frame_loop.take(),
        }
    }

    pub fn status(&self) -> ScannerStatus {
        let strategy = match self.phase {
            ScannerPhase::Active(kind) => Some(kind),
            _ => None,
        };
        ScannerStatus {
            phase: self.phase,
            strategy,
            is_active: strategy.is_some(),
            last_result: self.last_result.clone(),
            error: self.error.clone(),
        }
    }
}

/// Resources taken out of a torn-down session
#[must_use]
pub(crate) struct ReleasedSession {
    stream: Option<Arc<dyn MediaStream>>,
    frame_loop: Option<FrameLoopController>,
}

impl ReleasedSession {
    /// Cancel the loop, stop every track, detach the sink. Best effort.
    pub fn release(self, sink: &dyn VideoSink) {
        if let Some(frame_loop) = self.frame_loop {
            frame_loop.stop();
        }
        if let Some(stream) = self.stream {
            let tracks = stream.tracks();
            debug!(tracks = tracks.len(), "Stopping camera tracks");
            for track in tracks {
                track.stop();
            }
            sink.attach(None);
        }
    }
}
