// SPDX-License-Identifier: GPL-3.0-only

//! Scanner controller
//!
//! Owns one scanning session at a time: camera stream, frame loop, debounce
//! state and the observable status. All session state sits behind a single
//! mutex shared with the frame loop task; the lock is never held across an
//! `.await`, and callbacks run outside it so they may call [`stop`].
//!
//! [`stop`]: ScannerController::stop

use super::session::{ScannerPhase, ScannerStatus, SessionState};
use super::strategy::{self, DecodeStrategy, FrameOutcome, StrategyKind};
use crate::backends::camera::frame_loop::FrameStep;
use crate::backends::camera::{
    CameraPlatform, FrameLoopController, LoopAction, LoopToken, MediaRequest, MediaStream,
    TrackConstraintSet, VideoSink,
};
use crate::config::ScannerConfig;
use crate::errors::{ScannerError, ScannerResult};
use crate::frame_processor::{DecodedBarcode, ScanResult};
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, trace, warn};

/// Callback fired for every accepted scan
pub type ScanCallback = Arc<dyn Fn(&ScanResult) + Send + Sync>;

/// Wall clock used to timestamp scans
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> i64;
}

/// [`TimeSource`] backed by the system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// State shared between the controller and its frame loop
struct Shared {
    platform: Arc<dyn CameraPlatform>,
    sink: Arc<dyn VideoSink>,
    config: ScannerConfig,
    on_scan: Option<ScanCallback>,
    time: Arc<dyn TimeSource>,
    session: Mutex<SessionState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Debounce one decode and publish it. Runs on the frame loop task.
    fn emit(&self, token: &LoopToken, decoded: DecodedBarcode) -> LoopAction {
        let mut session = self.lock();
        if token.is_stopped() {
            return LoopAction::Stop;
        }

        let now = self.time.now_ms();
        let Some(result) = session.debouncer.accept(decoded.text, decoded.format, now) else {
            trace!("Duplicate scan inside debounce window");
            return LoopAction::Continue;
        };
        session.last_result = Some(result.clone());
        let released = (!self.config.continuous).then(|| session.teardown());
        drop(session);

        info!(text = %result.text, format = ?result.format, "Accepted scan");

        if let Some(released) = released {
            debug!("Single scan complete, stopping scanner");
            released.release(self.sink.as_ref());
        }
        if let Some(on_scan) = &self.on_scan {
            on_scan(&result);
        }

        if self.config.continuous {
            LoopAction::Continue
        } else {
            LoopAction::Stop
        }
    }

    /// Surface a non-fatal decode failure; the loop keeps running
    fn report_error(&self, token: &LoopToken, message: String) {
        let mut session = self.lock();
        if token.is_live() {
            session.error = Some(message);
        }
    }
}

/// One paint tick of the scanning loop
struct ScanStep {
    shared: Arc<Shared>,
    strategy: Box<dyn DecodeStrategy>,
    token: LoopToken,
}

impl FrameStep for ScanStep {
    fn step(&mut self) -> BoxFuture<'_, LoopAction> {
        Box::pin(async move {
            let outcome = self.strategy.scan(self.shared.sink.as_ref()).await;

            // stop() may have run while the decode was in flight
            if self.token.is_stopped() {
                trace!("Discarding frame result after stop");
                return LoopAction::Stop;
            }

            match outcome {
                FrameOutcome::NotReady | FrameOutcome::NoCode => LoopAction::Continue,
                FrameOutcome::Hit(decoded) => self.shared.emit(&self.token, decoded),
                FrameOutcome::Failed(message) => {
                    warn!(error = %message, "Barcode decode error");
                    self.shared.report_error(&self.token, message);
                    LoopAction::Continue
                }
            }
        })
    }
}

/// Releases a half-started session when the `start()` future is dropped
/// before it completes
struct StartGuard<'a> {
    shared: &'a Shared,
    token: LoopToken,
    armed: bool,
}

impl StartGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let released = {
            let mut session = self.shared.lock();
            // stop() already tore this attempt down
            if self.token.is_stopped() {
                return;
            }
            session.teardown()
        };
        debug!("Scanner start abandoned, releasing camera");
        released.release(self.shared.sink.as_ref());
    }
}

/// Builder for [`ScannerController`]
pub struct ScannerBuilder {
    platform: Arc<dyn CameraPlatform>,
    sink: Arc<dyn VideoSink>,
    config: ScannerConfig,
    on_scan: Option<ScanCallback>,
    time: Arc<dyn TimeSource>,
}

impl ScannerBuilder {
    pub fn config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn on_scan<F>(mut self, on_scan: F) -> Self
    where
        F: Fn(&ScanResult) + Send + Sync + 'static,
    {
        self.on_scan = Some(Arc::new(on_scan));
        self
    }

    pub fn time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = time;
        self
    }

    pub fn build(self) -> ScannerController {
        let session = SessionState::new(self.config.debounce_ms);
        ScannerController {
            shared: Arc::new(Shared {
                platform: self.platform,
                sink: self.sink,
                config: self.config,
                on_scan: self.on_scan,
                time: self.time,
                session: Mutex::new(session),
            }),
        }
    }
}

/// Camera barcode scanner
///
/// ```ignore
/// let scanner = ScannerController::builder(platform, sink)
///     .on_scan(|scan| println!("{}", scan.text))
///     .build();
/// scanner.start().await?;
/// // ...
/// scanner.stop();
/// ```
///
/// Dropping the controller stops the session.
pub struct ScannerController {
    shared: Arc<Shared>,
}

impl ScannerController {
    pub fn builder(platform: Arc<dyn CameraPlatform>, sink: Arc<dyn VideoSink>) -> ScannerBuilder {
        ScannerBuilder {
            platform,
            sink,
            config: ScannerConfig::default(),
            on_scan: None,
            time: Arc::new(SystemTimeSource),
        }
    }

    pub fn new(
        platform: Arc<dyn CameraPlatform>,
        sink: Arc<dyn VideoSink>,
        config: ScannerConfig,
    ) -> Self {
        Self::builder(platform, sink).config(config).build()
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.shared.config
    }

    /// Acquire the camera and start scanning
    ///
    /// Fatal failures are recorded in [`error`](Self::error) and also
    /// returned. Calling this while a session is starting or active returns
    /// [`ScannerError::AlreadyActive`] and leaves that session untouched.
    pub async fn start(&self) -> ScannerResult<()> {
        let token = {
            let mut session = self.shared.lock();
            if session.phase != ScannerPhase::Idle {
                warn!(phase = ?session.phase, "Scanner already running, ignoring start");
                return Err(ScannerError::AlreadyActive);
            }
            session.error = None;
            session.phase = ScannerPhase::Starting;
            session.token = LoopToken::new();
            session.token.clone()
        };

        info!("Starting barcode scanner");

        let guard = StartGuard {
            shared: &self.shared,
            token: token.clone(),
            armed: true,
        };
        let outcome = self.start_session(&token).await;
        guard.disarm();

        match outcome {
            Ok(kind) => {
                info!(strategy = %kind, "Barcode scanner active");
                Ok(())
            }
            Err(ScannerError::Cancelled) => {
                debug!("Scanner start cancelled");
                Err(ScannerError::Cancelled)
            }
            Err(err) => {
                let released = {
                    let mut session = self.shared.lock();
                    if token.is_stopped() {
                        let orphaned = session.is_released();
                        drop(session);
                        if orphaned {
                            self.shared.sink.attach(None);
                        }
                        debug!(error = %err, "Start failed after stop, discarding");
                        return Err(ScannerError::Cancelled);
                    }
                    session.error = Some(err.to_string());
                    session.teardown()
                };
                warn!(error = %err, "Failed to start barcode scanner");
                released.release(self.shared.sink.as_ref());
                Err(err)
            }
        }
    }

    async fn start_session(&self, token: &LoopToken) -> ScannerResult<StrategyKind> {
        let shared = &self.shared;

        shared.platform.capabilities().ensure_camera_access()?;

        let request = MediaRequest::video_only(shared.config.video.clone());
        let stream = shared.platform.get_user_media(&request).await?;
        {
            let mut session = shared.lock();
            if token.is_stopped() {
                drop(session);
                stop_stream(stream.as_ref());
                return Err(ScannerError::Cancelled);
            }
            session.stream = Some(Arc::clone(&stream));
        }

        shared.sink.attach(Some(stream));
        shared.sink.play().await.map_err(ScannerError::Playback)?;

        let strategy = strategy::select(shared.platform.as_ref(), &shared.config.preferred_formats);
        let kind = strategy.kind();
        let clock = shared.platform.frame_clock();

        let mut session = shared.lock();
        if token.is_stopped() {
            let orphaned = session.is_released();
            drop(session);
            if orphaned {
                shared.sink.attach(None);
            }
            return Err(ScannerError::Cancelled);
        }
        let step = ScanStep {
            shared: Arc::clone(shared),
            strategy,
            token: token.clone(),
        };
        session.frame_loop = Some(FrameLoopController::spawn(
            "barcode-scan",
            clock,
            token.clone(),
            step,
        ));
        session.phase = ScannerPhase::Active(kind);
        Ok(kind)
    }

    /// Release the camera and cancel the frame loop. Idempotent, never fails.
    pub fn stop(&self) {
        let released = {
            let mut session = self.shared.lock();
            if session.phase == ScannerPhase::Idle && session.is_released() {
                trace!("Scanner already stopped");
                return;
            }
            session.teardown()
        };
        info!("Stopping barcode scanner");
        released.release(self.shared.sink.as_ref());
    }

    /// Switch the torch of the active camera
    ///
    /// Silently does nothing when there is no live video track or the
    /// camera has no torch.
    pub async fn toggle_torch(&self, on: bool) -> ScannerResult<()> {
        let track = {
            let session = self.shared.lock();
            match session.phase {
                ScannerPhase::Active(_) => session
                    .stream
                    .as_ref()
                    .and_then(|stream| stream.video_tracks().into_iter().next()),
                _ => None,
            }
        };

        let Some(track) = track else {
            debug!("No active video track, torch unchanged");
            return Ok(());
        };
        // stop() may have released the track after the lock was dropped
        if !track.is_live() {
            debug!("Video track stopped, torch unchanged");
            return Ok(());
        }
        if !track.capabilities().torch {
            debug!(camera = %track.label(), "Camera has no torch");
            return Ok(());
        }

        let constraints = TrackConstraintSet { torch: Some(on) };
        track.apply_constraints(&constraints).await.map_err(|e| {
            warn!(error = %e, on, "Failed to toggle torch");
            ScannerError::Torch(e)
        })?;
        info!(on, "Torch toggled");
        Ok(())
    }

    /// Decode the current frame once, outside the frame loop
    ///
    /// Uses a fresh strategy instance. The result bypasses the debouncer
    /// and the scan callback.
    pub async fn scan_once(&self) -> ScannerResult<Option<ScanResult>> {
        if !self.is_active() {
            return Err(ScannerError::NotActive);
        }

        let shared = &self.shared;
        let strategy = strategy::select(shared.platform.as_ref(), &shared.config.preferred_formats);
        match strategy.scan(shared.sink.as_ref()).await {
            FrameOutcome::Hit(decoded) => {
                info!(text = %decoded.text, "Manual scan found barcode");
                Ok(Some(ScanResult::new(
                    decoded.text,
                    decoded.format,
                    shared.time.now_ms(),
                )))
            }
            FrameOutcome::Failed(message) => {
                debug!(error = %message, "Manual scan failed");
                Ok(None)
            }
            FrameOutcome::NotReady | FrameOutcome::NoCode => {
                debug!("Manual scan found no barcode");
                Ok(None)
            }
        }
    }

    pub fn status(&self) -> ScannerStatus {
        self.shared.lock().status()
    }

    pub fn phase(&self) -> ScannerPhase {
        self.shared.lock().phase
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase(), ScannerPhase::Active(_))
    }

    /// Decode strategy of the active session
    pub fn strategy(&self) -> Option<StrategyKind> {
        self.status().strategy
    }

    pub fn last_result(&self) -> Option<ScanResult> {
        self.shared.lock().last_result.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.shared.lock().error.clone()
    }
}

impl Drop for ScannerController {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ScannerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.status();
        f.debug_struct("ScannerController")
            .field("phase", &status.phase)
            .field("error", &status.error)
            .finish()
    }
}

fn stop_stream(stream: &dyn MediaStream) {
    for track in stream.tracks() {
        track.stop();
    }
}
