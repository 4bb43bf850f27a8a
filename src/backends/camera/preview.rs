// SPDX-License-Identifier: GPL-3.0-only

//! Generic preview surface
//!
//! Holds the attached stream and, once playing, exposes the first video
//! track's most recent frame. Hosts that render the preview elsewhere can
//! wrap this or implement [`VideoSink`] themselves.

use super::{MediaStream, VideoFrame, VideoSink};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

#[derive(Default)]
pub struct PreviewSink {
    stream: Mutex<Option<Arc<dyn MediaStream>>>,
    playing: AtomicBool,
}

impl PreviewSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

impl VideoSink for PreviewSink {
    fn attach(&self, stream: Option<Arc<dyn MediaStream>>) {
        let mut slot = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        if stream.is_none() {
            self.playing.store(false, Ordering::SeqCst);
        }
        debug!(attached = stream.is_some(), "Preview stream changed");
        *slot = stream;
    }

    fn play(&self) -> BoxFuture<'_, Result<(), String>> {
        Box::pin(async move {
            if !self.is_attached() {
                return Err("No stream attached to preview".to_string());
            }
            self.playing.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        if !self.is_playing() {
            return None;
        }
        let stream = self
            .stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()?;
        let track = stream.video_tracks().into_iter().next()?;
        if !track.is_live() {
            return None;
        }
        track.latest_frame()
    }
}

impl std::fmt::Debug for PreviewSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSink")
            .field("attached", &self.is_attached())
            .field("playing", &self.is_playing())
            .finish()
    }
}
