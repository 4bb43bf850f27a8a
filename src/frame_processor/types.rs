// SPDX-License-Identifier: GPL-3.0-only

//! Core types for frame decoding results
//!
//! These types represent the output of the detect/decode step and the
//! events handed to scan callbacks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A rectangular region within a frame
///
/// Coordinates are normalized (0.0 to 1.0) relative to the frame dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRegion {
    /// Left edge (0.0 = left of frame, 1.0 = right of frame)
    pub x: f32,
    /// Top edge (0.0 = top of frame, 1.0 = bottom of frame)
    pub y: f32,
    /// Width as fraction of frame width
    pub width: f32,
    /// Height as fraction of frame height
    pub height: f32,
}

impl FrameRegion {
    /// Create a frame region from pixel coordinates
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        Self {
            x: x as f32 / frame_width as f32,
            y: y as f32 / frame_height as f32,
            width: width as f32 / frame_width as f32,
            height: height as f32 / frame_height as f32,
        }
    }
}

/// Barcode symbology
///
/// Names follow the shape detection API identifiers (`qr_code`, `ean_13`, ...)
/// so configuration files and native detectors share one vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    QrCode,
    Code128,
    Ean13,
    Ean8,
    UpcA,
    UpcE,
    Code39,
    Code93,
    Itf,
    Pdf417,
    DataMatrix,
    Codabar,
    Aztec,
}

impl BarcodeFormat {
    /// All known symbologies
    pub const ALL: [BarcodeFormat; 13] = [
        BarcodeFormat::QrCode,
        BarcodeFormat::Code128,
        BarcodeFormat::Ean13,
        BarcodeFormat::Ean8,
        BarcodeFormat::UpcA,
        BarcodeFormat::UpcE,
        BarcodeFormat::Code39,
        BarcodeFormat::Code93,
        BarcodeFormat::Itf,
        BarcodeFormat::Pdf417,
        BarcodeFormat::DataMatrix,
        BarcodeFormat::Codabar,
        BarcodeFormat::Aztec,
    ];

    /// Wire name of the symbology
    pub fn as_str(&self) -> &'static str {
        match self {
            BarcodeFormat::QrCode => "qr_code",
            BarcodeFormat::Code128 => "code_128",
            BarcodeFormat::Ean13 => "ean_13",
            BarcodeFormat::Ean8 => "ean_8",
            BarcodeFormat::UpcA => "upc_a",
            BarcodeFormat::UpcE => "upc_e",
            BarcodeFormat::Code39 => "code_39",
            BarcodeFormat::Code93 => "code_93",
            BarcodeFormat::Itf => "itf",
            BarcodeFormat::Pdf417 => "pdf417",
            BarcodeFormat::DataMatrix => "data_matrix",
            BarcodeFormat::Codabar => "codabar",
            BarcodeFormat::Aztec => "aztec",
        }
    }

    /// Whether the symbology is two-dimensional
    pub fn is_matrix(&self) -> bool {
        matches!(
            self,
            BarcodeFormat::QrCode
                | BarcodeFormat::Pdf417
                | BarcodeFormat::DataMatrix
                | BarcodeFormat::Aztec
        )
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BarcodeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        BarcodeFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == normalized)
            .ok_or_else(|| format!("Unknown barcode format: {}", s))
    }
}

/// A barcode decoded from a single frame, before debouncing
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBarcode {
    /// Decoded payload
    pub text: String,
    /// Symbology name as reported by the decoder
    pub format: Option<String>,
    /// Location in normalized frame coordinates, if the decoder reports one
    pub bounds: Option<FrameRegion>,
}

impl DecodedBarcode {
    pub fn new(text: impl Into<String>, format: Option<String>) -> Self {
        Self {
            text: text.into(),
            format,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, bounds: FrameRegion) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// An accepted, debounced scan event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Decoded payload
    pub text: String,
    /// Symbology name, when known
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub format: Option<String>,
    /// Capture instant in milliseconds since the Unix epoch
    #[serde(rename = "ts")]
    pub timestamp: i64,
}

impl ScanResult {
    pub fn new(text: impl Into<String>, format: Option<String>, timestamp: i64) -> Self {
        Self {
            text: text.into(),
            format,
            timestamp,
        }
    }
}
