// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the barcode scanner

use std::fmt;

/// Result type alias using ScannerError
pub type ScannerResult<T> = Result<T, ScannerError>;

/// Main scanner error type
///
/// Environment, acquisition and playback errors are fatal to `start()`.
/// Per-frame failures never show up here; they are reported through
/// [`ReadError`] and [`DetectError`] and handled inside the frame loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ScannerError {
    /// The runtime cannot provide camera access at all
    Environment(EnvironmentError),
    /// The camera stream could not be acquired
    Acquisition(AcquisitionError),
    /// The video sink refused to play the stream
    Playback(String),
    /// `start()` was called while a session is starting or active
    AlreadyActive,
    /// The operation needs an active session
    NotActive,
    /// `stop()` was called while `start()` was still acquiring the camera
    Cancelled,
    /// Applying the torch constraint failed
    Torch(String),
    /// Configuration errors
    Config(String),
}

/// Runtime capability errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentError {
    /// No camera/media devices API
    CameraApiUnavailable,
    /// Media devices API present but stream acquisition is not
    GetUserMediaUnavailable,
    /// Camera access requires a secure (https or loopback) origin
    InsecureContext { host: String },
}

/// Camera acquisition errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    /// The user or the system denied camera permission
    PermissionDenied,
    /// No camera matches the request
    DeviceNotFound,
    /// Camera is busy or in use
    DeviceBusy,
    /// The constraint set cannot be satisfied
    Overconstrained(String),
    /// Backend specific failure
    Other(String),
}

/// Outcome of a software decode attempt that did not produce a barcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// No barcode in this frame; expected, never surfaced
    NotFound,
    /// A real decode failure
    Failed(String),
}

/// Native detector failure for a single frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectError(pub String);

impl fmt::Display for ScannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScannerError::Environment(e) => write!(f, "{}", e),
            ScannerError::Acquisition(e) => write!(f, "Camera error: {}", e),
            ScannerError::Playback(msg) => write!(f, "Failed to play camera stream: {}", msg),
            ScannerError::AlreadyActive => write!(f, "Scanner is already active"),
            ScannerError::NotActive => write!(f, "Scanner is not active"),
            ScannerError::Cancelled => write!(f, "Scanner start was cancelled"),
            ScannerError::Torch(msg) => write!(f, "Torch error: {}", msg),
            ScannerError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl fmt::Display for EnvironmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentError::CameraApiUnavailable => write!(
                f,
                "Camera API is not supported on this platform. Please use a modern browser with HTTPS."
            ),
            EnvironmentError::GetUserMediaUnavailable => {
                write!(f, "Camera stream acquisition is not supported on this platform")
            }
            EnvironmentError::InsecureContext { host } => write!(
                f,
                "Camera access requires HTTPS (host '{}' is not a loopback address)",
                host
            ),
        }
    }
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionError::PermissionDenied => write!(f, "Camera permission denied"),
            AcquisitionError::DeviceNotFound => write!(f, "No camera device found"),
            AcquisitionError::DeviceBusy => write!(f, "Camera is busy"),
            AcquisitionError::Overconstrained(msg) => {
                write!(f, "Camera constraints cannot be satisfied: {}", msg)
            }
            AcquisitionError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::NotFound => write!(f, "No barcode found in frame"),
            ReadError::Failed(msg) => write!(f, "Decode error: {}", msg),
        }
    }
}

impl fmt::Display for DetectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Detection failed: {}", self.0)
    }
}

impl std::error::Error for ScannerError {}
impl std::error::Error for EnvironmentError {}
impl std::error::Error for AcquisitionError {}
impl std::error::Error for ReadError {}
impl std::error::Error for DetectError {}

impl From<EnvironmentError> for ScannerError {
    fn from(err: EnvironmentError) -> Self {
        ScannerError::Environment(err)
    }
}

impl From<AcquisitionError> for ScannerError {
    fn from(err: AcquisitionError) -> Self {
        ScannerError::Acquisition(err)
    }
}

impl From<serde_json::Error> for ScannerError {
    fn from(err: serde_json::Error) -> Self {
        ScannerError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_error_messages_are_descriptive() {
        let err = ScannerError::from(EnvironmentError::InsecureContext {
            host: "example.com".to_string(),
        });
        let msg = err.to_string();
        assert!(msg.contains("HTTPS"));
        assert!(msg.contains("example.com"));
    }

    #[test]
    fn test_acquisition_error_conversion() {
        let err: ScannerError = AcquisitionError::PermissionDenied.into();
        assert_eq!(err, ScannerError::Acquisition(AcquisitionError::PermissionDenied));
        assert!(!err.to_string().is_empty());
    }
}
