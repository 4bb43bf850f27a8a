// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end tests running the scanner against the still-image camera

use barcode_scanner::backends::camera::{PixelFormat, VideoFrame, VideoSink};
use barcode_scanner::scanner::{ScannerPhase, StrategyKind};
use barcode_scanner::{PreviewSink, ScannerConfig, ScannerController, VirtualCamera};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn blank_frame() -> VideoFrame {
    VideoFrame::new(64, 64, PixelFormat::Gray, vec![255u8; 64 * 64])
}

#[tokio::test]
async fn test_blank_feed_runs_software_path_without_results() {
    let camera = VirtualCamera::from_frames(vec![blank_frame()])
        .with_looping(true)
        .with_refresh_rate(200);
    let sink = Arc::new(PreviewSink::new());
    let scans = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&scans);

    let scanner = ScannerController::builder(Arc::new(camera), Arc::clone(&sink) as Arc<dyn VideoSink>)
        .on_scan(move |scan| recorded.lock().unwrap().push(scan.clone()))
        .build();

    scanner.start().await.unwrap();
    assert_eq!(scanner.phase(), ScannerPhase::Active(StrategyKind::Software));
    assert!(sink.is_playing());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(scans.lock().unwrap().is_empty());
    assert_eq!(scanner.error(), None);

    scanner.stop();
    assert!(!sink.is_attached());
}

#[tokio::test]
async fn test_empty_feed_reports_missing_device() {
    let scanner = ScannerController::new(
        Arc::new(VirtualCamera::from_frames(Vec::new())),
        Arc::new(PreviewSink::new()),
        ScannerConfig::default(),
    );

    assert!(scanner.start().await.is_err());
    assert_eq!(scanner.phase(), ScannerPhase::Idle);
    assert!(scanner.error().is_some());
}
