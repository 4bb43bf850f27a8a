// SPDX-License-Identifier: GPL-3.0-only

//! Software QR code reader
//!
//! This module implements the software decode path using the rqrr crate.
//! It converts camera frames to grayscale, downscales them for speed, and
//! decodes the first readable QR grid.

use crate::backends::camera::FrameReader;
use crate::backends::camera::types::{PixelFormat, VideoFrame};
use crate::constants;
use crate::errors::ReadError;
use crate::frame_processor::types::{BarcodeFormat, DecodedBarcode, FrameRegion};
use futures::future::BoxFuture;
use image::{GrayImage, imageops::FilterType};
use tracing::{debug, trace, warn};

/// QR code reader
///
/// Optimized for real-time processing with frame downscaling.
#[derive(Debug, Clone)]
pub struct QrReader {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrReader {
    fn default() -> Self {
        Self::new()
    }
}

impl QrReader {
    pub fn new() -> Self {
        Self {
            max_dimension: constants::reader::MAX_DIMENSION,
        }
    }

    /// Create a QR reader with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }
}

impl FrameReader for QrReader {
    fn decode(&self, frame: VideoFrame) -> BoxFuture<'_, Result<DecodedBarcode, ReadError>> {
        let max_dim = self.max_dimension;
        Box::pin(async move {
            // CPU-bound; keep it off the async workers
            tokio::task::spawn_blocking(move || decode_sync(&frame, max_dim))
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "QR decode task panicked");
                    Err(ReadError::Failed(e.to_string()))
                })
        })
    }
}

/// Synchronous QR decode (runs in blocking task)
pub fn decode_sync(frame: &VideoFrame, max_dimension: u32) -> Result<DecodedBarcode, ReadError> {
    if !frame.has_dimensions() {
        return Err(ReadError::NotFound);
    }

    let start = std::time::Instant::now();
    let luma = to_luma(frame).ok_or_else(|| {
        ReadError::Failed(format!(
            "Frame buffer too small for {}x{} (stride {})",
            frame.width, frame.height, frame.stride
        ))
    })?;

    let (luma, scale) = downscale(luma, max_dimension);
    let (proc_width, proc_height) = luma.dimensions();
    trace!(
        proc_width,
        proc_height,
        scale,
        conversion_ms = start.elapsed().as_millis(),
        "Prepared luma image for decoding"
    );

    let mut prepared = rqrr::PreparedImage::prepare(luma);
    let grids = prepared.detect_grids();
    if grids.is_empty() {
        return Err(ReadError::NotFound);
    }

    let mut last_error = None;
    for grid in &grids {
        match grid.decode() {
            Ok((_meta, content)) => {
                let bounds = grid_bounds(&grid.bounds, scale, frame.width, frame.height);
                debug!(
                    content = %content,
                    total_ms = start.elapsed().as_millis(),
                    "Decoded QR code"
                );
                return Ok(
                    DecodedBarcode::new(content, Some(BarcodeFormat::QrCode.to_string()))
                        .with_bounds(bounds),
                );
            }
            Err(e) => {
                debug!(error = %e, "Failed to decode QR grid");
                last_error = Some(e.to_string());
            }
        }
    }

    Err(ReadError::Failed(
        last_error.unwrap_or_else(|| "Unreadable QR code".to_string()),
    ))
}

/// Convert a frame to a tightly packed luma image, dropping stride padding
fn to_luma(frame: &VideoFrame) -> Option<GrayImage> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;
    let bpp = frame.format.bytes_per_pixel();

    if stride < width * bpp || frame.data.len() < stride * (height - 1) + width * bpp {
        return None;
    }

    let mut luma = Vec::with_capacity(width * height);
    for y in 0..height {
        let row = &frame.data[y * stride..y * stride + width * bpp];
        match frame.format {
            PixelFormat::Gray => luma.extend_from_slice(row),
            PixelFormat::Rgba => luma.extend(row.chunks_exact(4).map(|px| {
                // BT.601 integer weights
                ((px[0] as u32 * 77 + px[1] as u32 * 150 + px[2] as u32 * 29) >> 8) as u8
            })),
        }
    }

    GrayImage::from_raw(frame.width, frame.height, luma)
}

/// Downscale so the long side fits `max_dimension`; returns the scale factor
fn downscale(image: GrayImage, max_dimension: u32) -> (GrayImage, f32) {
    let (width, height) = image.dimensions();
    if width <= max_dimension && height <= max_dimension {
        return (image, 1.0);
    }
    let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
    let new_width = ((width as f32 / scale) as u32).max(1);
    let new_height = ((height as f32 / scale) as u32).max(1);
    let resized = image::imageops::resize(&image, new_width, new_height, FilterType::Triangle);
    (resized, scale)
}

/// Bounding box of the four grid corners in normalized frame coordinates
fn grid_bounds(corners: &[rqrr::Point; 4], scale: f32, width: u32, height: u32) -> FrameRegion {
    let xs = corners.iter().map(|p| p.x as f32 * scale);
    let ys = corners.iter().map(|p| p.y as f32 * scale);
    let min_x = xs.clone().fold(f32::MAX, f32::min).max(0.0);
    let max_x = xs.fold(f32::MIN, f32::max).min(width as f32);
    let min_y = ys.clone().fold(f32::MAX, f32::min).max(0.0);
    let max_y = ys.fold(f32::MIN, f32::max).min(height as f32);

    FrameRegion::from_pixels(
        min_x as u32,
        min_y as u32,
        (max_x - min_x).max(0.0) as u32,
        (max_y - min_y).max(0.0) as u32,
        width,
        height,
    )
}
