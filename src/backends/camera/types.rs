// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera platform abstraction

//! Shared types for camera platforms

use crate::constants::{self, LOOPBACK_HOSTS};
use crate::errors::EnvironmentError;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

/// Pixel layout of a video frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGBA, 4 bytes per pixel
    #[default]
    Rgba,
    /// 8-bit luma only, 1 byte per pixel
    Gray,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgba => 4,
            PixelFormat::Gray => 1,
        }
    }
}

/// A single decoded video frame
///
/// Pixel data is reference counted so frames can be handed to blocking
/// decode tasks without copying.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    pub captured_at: Instant,
}

impl VideoFrame {
    /// Build a tightly packed frame
    pub fn new(width: u32, height: u32, format: PixelFormat, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
            format,
            stride: width * format.bytes_per_pixel() as u32,
            captured_at: Instant::now(),
        }
    }

    /// A frame the video element has not decoded yet reports zero dimensions
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Camera facing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Rear camera
    #[default]
    Environment,
    /// Front (selfie) camera
    User,
    Left,
    Right,
}

/// Focus, exposure and white balance control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlMode {
    None,
    Manual,
    SingleShot,
    Continuous,
}

/// Numeric constraint with optional bounds and a preferred value
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConstrainRange<T> {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub min: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ideal: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> ConstrainRange<T> {
    pub fn ideal(value: T) -> Self {
        Self {
            min: None,
            ideal: Some(value),
            max: None,
        }
    }

    pub fn with_min(mut self, min: T) -> Self {
        self.min = Some(min);
        self
    }

    /// Check whether a concrete value satisfies the hard bounds
    pub fn admits(&self, value: T) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Capture device constraint set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConstraints {
    pub facing_mode: Option<FacingMode>,
    pub width: ConstrainRange<u32>,
    pub height: ConstrainRange<u32>,
    pub aspect_ratio: ConstrainRange<f64>,
    pub focus_mode: Option<ControlMode>,
    pub exposure_mode: Option<ControlMode>,
    pub white_balance_mode: Option<ControlMode>,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        use constants::video::*;
        Self {
            facing_mode: Some(FacingMode::Environment),
            width: ConstrainRange::ideal(IDEAL_WIDTH).with_min(MIN_WIDTH),
            height: ConstrainRange::ideal(IDEAL_HEIGHT).with_min(MIN_HEIGHT),
            aspect_ratio: ConstrainRange::ideal(IDEAL_ASPECT_RATIO),
            focus_mode: Some(ControlMode::Continuous),
            exposure_mode: Some(ControlMode::Manual),
            white_balance_mode: Some(ControlMode::Manual),
        }
    }
}

/// Stream request handed to the platform
///
/// Audio is never requested by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRequest {
    pub video: VideoConstraints,
    pub audio: bool,
}

impl MediaRequest {
    pub fn video_only(video: VideoConstraints) -> Self {
        Self {
            video,
            audio: false,
        }
    }
}

/// Capabilities advertised by a live video track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackCapabilities {
    pub torch: bool,
}

/// Constraint change applied to a live track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackConstraintSet {
    pub torch: Option<bool>,
}

/// Where the scanner runs, for the secure-context check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityContext {
    /// Native process, no origin restrictions
    Native,
    /// Web origin
    Origin { scheme: String, host: String },
}

impl SecurityContext {
    pub fn origin(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        SecurityContext::Origin {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    /// Camera capture is only allowed over https or from a loopback host
    pub fn is_secure(&self) -> bool {
        match self {
            SecurityContext::Native => true,
            SecurityContext::Origin { scheme, host } => {
                scheme.eq_ignore_ascii_case("https") || is_loopback_host(host)
            }
        }
    }
}

fn is_loopback_host(host: &str) -> bool {
    let host = host.trim().to_lowercase();
    if LOOPBACK_HOSTS.contains(&host.as_str()) || host.ends_with(".localhost") {
        return true;
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}

/// Runtime capability probe result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCapabilities {
    /// A camera/media devices API exists
    pub media_devices: bool,
    /// Streams can be requested from it
    pub get_user_media: bool,
    pub security: SecurityContext,
}

impl PlatformCapabilities {
    /// Capabilities of a native platform with a working camera API
    pub fn native() -> Self {
        Self {
            media_devices: true,
            get_user_media: true,
            security: SecurityContext::Native,
        }
    }

    /// Fail fast when the environment cannot provide a camera
    pub fn ensure_camera_access(&self) -> Result<(), EnvironmentError> {
        if !self.media_devices {
            return Err(EnvironmentError::CameraApiUnavailable);
        }
        if !self.get_user_media {
            return Err(EnvironmentError::GetUserMediaUnavailable);
        }
        if let SecurityContext::Origin { host, .. } = &self.security
            && !self.security.is_secure()
        {
            return Err(EnvironmentError::InsecureContext { host: host.clone() });
        }
        Ok(())
    }
}

/// Result type for backend loaders
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Source file could not be read or decoded
    IoError(String),
    /// Unsupported input
    FormatNotSupported(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}
