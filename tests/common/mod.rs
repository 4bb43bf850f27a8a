// SPDX-License-Identifier: GPL-3.0-only

//! Scripted camera platform shared by the integration tests

#![allow(dead_code)]

use barcode_scanner::backends::camera::{
    BarcodeDetector, CameraPlatform, FrameClock, FrameReader, MediaRequest, MediaStream,
    PixelFormat, PlatformCapabilities, PreviewSink, TrackCapabilities, TrackConstraintSet,
    VideoFrame, VideoSink, VideoTrack,
};
use barcode_scanner::errors::{AcquisitionError, DetectError, ReadError};
use barcode_scanner::frame_processor::{BarcodeFormat, DecodedBarcode, ScanResult};
use barcode_scanner::scanner::{ScannerController, TimeSource};
use barcode_scanner::ScannerConfig;
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};

/// Let the frame loop task run until it parks on the clock
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

/// Frame clock that only ticks when the test says so
pub struct TickClock {
    permits: Semaphore,
}

impl Default for TickClock {
    fn default() -> Self {
        Self {
            permits: Semaphore::new(0),
        }
    }
}

impl TickClock {
    pub fn tick(&self, n: usize) {
        self.permits.add_permits(n);
    }
}

impl FrameClock for TickClock {
    fn next_tick(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if let Ok(permit) = self.permits.acquire().await {
                permit.forget();
            }
        })
    }
}

#[derive(Default)]
pub struct FakeTime(AtomicI64);

impl FakeTime {
    pub fn at(ms: i64) -> Self {
        Self(AtomicI64::new(ms))
    }

    pub fn advance(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl TimeSource for FakeTime {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct MockTrack {
    live: AtomicBool,
    torch: bool,
    torch_fails: bool,
    pub torch_calls: Mutex<Vec<bool>>,
    pub stop_calls: AtomicUsize,
}

impl MockTrack {
    pub fn is_stopped(&self) -> bool {
        !self.live.load(Ordering::SeqCst)
    }

    pub fn torch_calls(&self) -> Vec<bool> {
        self.torch_calls.lock().unwrap().clone()
    }
}

impl VideoTrack for MockTrack {
    fn label(&self) -> String {
        "Mock Camera".to_string()
    }

    fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.live.store(false, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn capabilities(&self) -> TrackCapabilities {
        TrackCapabilities { torch: self.torch }
    }

    fn apply_constraints<'a>(
        &'a self,
        constraints: &'a TrackConstraintSet,
    ) -> BoxFuture<'a, Result<(), String>> {
        Box::pin(async move {
            if let Some(on) = constraints.torch {
                self.torch_calls.lock().unwrap().push(on);
            }
            if self.torch_fails {
                Err("torch constraint rejected".to_string())
            } else {
                Ok(())
            }
        })
    }

    fn latest_frame(&self) -> Option<VideoFrame> {
        self.is_live()
            .then(|| VideoFrame::new(4, 4, PixelFormat::Gray, vec![0u8; 16]))
    }
}

struct MockStream {
    track: Arc<MockTrack>,
}

impl MediaStream for MockStream {
    fn tracks(&self) -> Vec<Arc<dyn VideoTrack>> {
        vec![Arc::clone(&self.track) as Arc<dyn VideoTrack>]
    }
}

/// Replays scripted results, then repeats the steady one
pub struct Script<T> {
    queue: Mutex<VecDeque<T>>,
    steady: Mutex<T>,
    calls: AtomicUsize,
    /// Signalled when a call starts waiting on the hold gate
    pub entered: Notify,
    hold: Mutex<Option<Arc<Notify>>>,
}

impl<T: Clone> Script<T> {
    pub fn new(steady: T) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            steady: Mutex::new(steady),
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            hold: Mutex::new(None),
        }
    }

    /// Make every following call wait on `gate` before returning
    pub fn hold_on(&self, gate: Arc<Notify>) {
        *self.hold.lock().unwrap() = Some(gate);
    }

    async fn wait_for_release(&self) {
        let gate = self.hold.lock().unwrap().clone();
        if let Some(gate) = gate {
            self.entered.notify_one();
            gate.notified().await;
        }
    }

    pub fn push(&self, item: T) {
        self.queue.lock().unwrap().push_back(item);
    }

    pub fn set_steady(&self, item: T) {
        *self.steady.lock().unwrap() = item;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> T {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let queued = self.queue.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| self.steady.lock().unwrap().clone())
    }
}

pub type DetectorScript = Script<Result<Vec<DecodedBarcode>, DetectError>>;
pub type ReaderScript = Script<Result<DecodedBarcode, ReadError>>;

impl BarcodeDetector for DetectorScript {
    fn detect<'a>(
        &'a self,
        _frame: &'a VideoFrame,
    ) -> BoxFuture<'a, Result<Vec<DecodedBarcode>, DetectError>> {
        Box::pin(async move {
            let item = self.next();
            self.wait_for_release().await;
            item
        })
    }
}

impl FrameReader for ReaderScript {
    fn decode(&self, _frame: VideoFrame) -> BoxFuture<'_, Result<DecodedBarcode, ReadError>> {
        Box::pin(async move {
            let item = self.next();
            self.wait_for_release().await;
            item
        })
    }
}

pub fn code(text: &str, format: &str) -> DecodedBarcode {
    DecodedBarcode::new(text, Some(format.to_string()))
}

pub struct MockPlatform {
    pub capabilities: Mutex<PlatformCapabilities>,
    pub acquire_error: Mutex<Option<AcquisitionError>>,
    pub detector: Option<Arc<DetectorScript>>,
    pub reader: Arc<ReaderScript>,
    pub clock: Arc<TickClock>,
    pub torch: bool,
    pub torch_fails: bool,
    /// When set, `get_user_media` waits for a notification
    pub acquire_gate: Option<Arc<Notify>>,
    pub requests: Mutex<Vec<MediaRequest>>,
    pub requested_formats: Mutex<Vec<BarcodeFormat>>,
    pub tracks: Mutex<Vec<Arc<MockTrack>>>,
}

impl MockPlatform {
    /// Platform with a native detector that finds nothing
    pub fn native() -> Self {
        Self {
            detector: Some(Arc::new(Script::new(Ok(Vec::new())))),
            ..Self::software()
        }
    }

    /// Platform without a native detector
    pub fn software() -> Self {
        Self {
            capabilities: Mutex::new(PlatformCapabilities::native()),
            acquire_error: Mutex::new(None),
            detector: None,
            reader: Arc::new(Script::new(Err(ReadError::NotFound))),
            clock: Arc::new(TickClock::default()),
            torch: false,
            torch_fails: false,
            acquire_gate: None,
            requests: Mutex::new(Vec::new()),
            requested_formats: Mutex::new(Vec::new()),
            tracks: Mutex::new(Vec::new()),
        }
    }

    pub fn detector(&self) -> &DetectorScript {
        self.detector.as_deref().expect("platform has no detector")
    }

    pub fn acquire_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_track(&self) -> Arc<MockTrack> {
        Arc::clone(self.tracks.lock().unwrap().last().expect("no stream acquired"))
    }
}

impl CameraPlatform for MockPlatform {
    fn capabilities(&self) -> PlatformCapabilities {
        self.capabilities.lock().unwrap().clone()
    }

    fn get_user_media<'a>(
        &'a self,
        request: &'a MediaRequest,
    ) -> BoxFuture<'a, Result<Arc<dyn MediaStream>, AcquisitionError>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(gate) = &self.acquire_gate {
                gate.notified().await;
            }
            if let Some(err) = self.acquire_error.lock().unwrap().clone() {
                return Err(err);
            }
            let track = Arc::new(MockTrack {
                live: AtomicBool::new(true),
                torch: self.torch,
                torch_fails: self.torch_fails,
                torch_calls: Mutex::new(Vec::new()),
                stop_calls: AtomicUsize::new(0),
            });
            self.tracks.lock().unwrap().push(Arc::clone(&track));
            Ok(Arc::new(MockStream { track }) as Arc<dyn MediaStream>)
        })
    }

    fn barcode_detector(&self, formats: &[BarcodeFormat]) -> Option<Arc<dyn BarcodeDetector>> {
        *self.requested_formats.lock().unwrap() = formats.to_vec();
        self.detector
            .as_ref()
            .map(|detector| Arc::clone(detector) as Arc<dyn BarcodeDetector>)
    }

    fn software_reader(&self) -> Arc<dyn FrameReader> {
        Arc::clone(&self.reader) as Arc<dyn FrameReader>
    }

    fn frame_clock(&self) -> Arc<dyn FrameClock> {
        Arc::clone(&self.clock) as Arc<dyn FrameClock>
    }
}

/// Controller wired to a mock platform, recording every callback
pub struct Harness {
    pub platform: Arc<MockPlatform>,
    pub sink: Arc<PreviewSink>,
    pub time: Arc<FakeTime>,
    pub scans: Arc<Mutex<Vec<ScanResult>>>,
    pub scanner: ScannerController,
}

impl Harness {
    pub fn new(platform: MockPlatform, config: ScannerConfig) -> Self {
        let platform = Arc::new(platform);
        let sink = Arc::new(PreviewSink::new());
        let time = Arc::new(FakeTime::at(10_000));
        let scans = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&scans);
        let scanner = ScannerController::builder(
            Arc::clone(&platform) as Arc<dyn CameraPlatform>,
            Arc::clone(&sink) as Arc<dyn VideoSink>,
        )
        .config(config)
        .time_source(Arc::clone(&time) as Arc<dyn TimeSource>)
        .on_scan(move |scan| recorded.lock().unwrap().push(scan.clone()))
        .build();

        Self {
            platform,
            sink,
            time,
            scans,
            scanner,
        }
    }

    pub fn scanned_texts(&self) -> Vec<String> {
        self.scans.lock().unwrap().iter().map(|s| s.text.clone()).collect()
    }

    /// Advance fake time, release one paint tick and let the loop run
    pub async fn next_frame(&self, elapsed_ms: i64) {
        self.time.advance(elapsed_ms);
        self.platform.clock.tick(1);
        settle().await;
    }
}
