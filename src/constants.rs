// SPDX-License-Identifier: GPL-3.0-only

//! Scanner-wide constants

use crate::frame_processor::BarcodeFormat;
use std::time::Duration;

/// Default window during which an identical decode is ignored
pub const DEFAULT_DEBOUNCE_MS: u64 = 800;

/// Symbologies requested from native detectors when none are configured
pub const DEFAULT_FORMATS: [BarcodeFormat; 11] = [
    BarcodeFormat::QrCode,
    BarcodeFormat::Code128,
    BarcodeFormat::Ean13,
    BarcodeFormat::Ean8,
    BarcodeFormat::UpcA,
    BarcodeFormat::UpcE,
    BarcodeFormat::Code39,
    BarcodeFormat::Itf,
    BarcodeFormat::Pdf417,
    BarcodeFormat::DataMatrix,
    BarcodeFormat::Codabar,
];

/// Default video capture constraints
pub mod video {
    pub const MIN_WIDTH: u32 = 640;
    pub const IDEAL_WIDTH: u32 = 1920;
    pub const MIN_HEIGHT: u32 = 480;
    pub const IDEAL_HEIGHT: u32 = 1080;
    pub const IDEAL_ASPECT_RATIO: f64 = 16.0 / 9.0;
}

/// Software reader tuning
pub mod reader {
    /// Frames are downscaled so the long side fits this size before decoding
    pub const MAX_DIMENSION: u32 = 640;
}

/// Scan history
pub mod history {
    pub const DEFAULT_CAPACITY: usize = 50;
}

/// Virtual camera playback
pub mod virtual_camera {
    use super::Duration;

    /// How long each still image stays on screen
    pub const DEFAULT_FRAME_HOLD: Duration = Duration::from_millis(500);
    /// Paint tick rate of the interval frame clock
    pub const DEFAULT_REFRESH_HZ: u32 = 30;
}

/// Supported still image file extensions
pub mod file_formats {
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif", "tiff"];

    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Hosts that count as a secure context without HTTPS
pub const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1", "[::1]"];
