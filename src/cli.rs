// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for scanner operations
//!
//! This module provides command-line functionality for:
//! - Scanning image files through the virtual camera
//! - Printing the effective configuration
//! - Listing supported symbologies

use barcode_scanner::backends::camera::PreviewSink;
use barcode_scanner::backends::virtual_camera::VirtualCamera;
use barcode_scanner::config::{ScannerConfig, default_config_path};
use barcode_scanner::frame_processor::{BarcodeFormat, ScanResult};
use barcode_scanner::scanner::{ScanHistory, ScannerController};
use futures::StreamExt;
use futures::channel::mpsc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Extra time after a one-pass playback for the last decode to land
const PLAYBACK_GRACE: Duration = Duration::from_millis(250);

/// How often the scan loop checks whether a single-shot session ended
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Options of the `scan` command
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub inputs: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub once: bool,
    pub looping: bool,
    pub debounce_ms: Option<u64>,
    pub hold_ms: Option<u64>,
    pub fps: Option<u32>,
    pub timeout: Option<u64>,
}

/// Scan image files as if they were a camera feed
///
/// Every accepted scan is printed as one JSON line on stdout.
pub fn scan_files(options: ScanOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ScannerConfig::load_or_default(options.config.as_deref())?;
    if options.once {
        config.continuous = false;
    }
    if let Some(debounce_ms) = options.debounce_ms {
        config.debounce_ms = debounce_ms;
    }

    let mut camera = VirtualCamera::from_files(&options.inputs)?.with_looping(options.looping);
    if let Some(hold_ms) = options.hold_ms {
        camera = camera.with_frame_hold(Duration::from_millis(hold_ms));
    }
    if let Some(fps) = options.fps {
        camera = camera.with_refresh_rate(fps);
    }

    eprintln!(
        "Scanning {} image(s){}",
        camera.frame_count(),
        if camera.is_looping() { " (looping)" } else { "" }
    );

    // A looping feed only ends on timeout or Ctrl+C
    let playback_limit = (!camera.is_looping()).then(|| camera.playback_duration() + PLAYBACK_GRACE);
    let limit = match (playback_limit, options.timeout.map(Duration::from_secs)) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };

    let rt = tokio::runtime::Runtime::new()?;
    let history = rt.block_on(run_scanner(Arc::new(camera), config, limit))?;

    eprintln!("{} unique code(s) found", history.len());
    Ok(())
}

async fn run_scanner(
    camera: Arc<VirtualCamera>,
    config: ScannerConfig,
    limit: Option<Duration>,
) -> Result<ScanHistory, Box<dyn std::error::Error>> {
    let (sender, mut receiver) = mpsc::unbounded::<ScanResult>();
    let sink = Arc::new(PreviewSink::new());

    let scanner = ScannerController::builder(camera, sink)
        .config(config)
        .on_scan(move |scan| {
            // Receiver only goes away once we stop printing
            let _ = sender.unbounded_send(scan.clone());
        })
        .build();

    scanner.start().await?;
    info!(strategy = ?scanner.strategy(), "Scanner running");

    let deadline = limit.map(|limit| tokio::time::Instant::now() + limit);
    let mut history = ScanHistory::default();
    let mut idle_check = tokio::time::interval(IDLE_POLL);

    loop {
        tokio::select! {
            Some(scan) = receiver.next() => {
                print_scan(&scan)?;
                if !history.record(&scan) {
                    debug!(text = %scan.text, "Code already seen");
                }
            }
            _ = idle_check.tick() => {
                if !scanner.is_active() {
                    debug!("Scanner went idle");
                    break;
                }
            }
            _ = sleep_until(deadline) => {
                debug!("Scan time limit reached");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Interrupted");
                break;
            }
        }
    }

    scanner.stop();

    // Results emitted right before stop are still queued
    while let Ok(scan) = receiver.try_recv() {
        print_scan(&scan)?;
        history.record(&scan);
    }

    if let Some(error) = scanner.error() {
        eprintln!("Last decode error: {}", error);
    }

    Ok(history)
}

async fn sleep_until(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn print_scan(scan: &ScanResult) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(scan)?);
    Ok(())
}

/// Print the effective configuration as JSON
pub fn show_config(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = ScannerConfig::load_or_default(path)?;
    if path.is_none()
        && let Some(default_path) = default_config_path()
    {
        eprintln!("Config file: {}", default_path.display());
    }
    println!("{}", config.to_json_pretty()?);
    Ok(())
}

/// List supported symbologies
pub fn list_formats() -> Result<(), Box<dyn std::error::Error>> {
    let defaults = ScannerConfig::default().preferred_formats;

    println!("Supported formats:");
    println!();
    for format in BarcodeFormat::ALL {
        let kind = if format.is_matrix() { "2D" } else { "1D" };
        let marker = if defaults.contains(&format) { "*" } else { " " };
        println!("  {} {:<12} {}", marker, format.as_str(), kind);
    }
    println!();
    println!("* requested by default from native detectors");
    println!("  The software reader decodes qr_code only.");
    Ok(())
}
