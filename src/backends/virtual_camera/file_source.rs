// SPDX-License-Identifier: GPL-3.0-only

//! Still image loading for the virtual camera

use crate::backends::camera::types::{BackendError, BackendResult, PixelFormat, VideoFrame};
use crate::constants::file_formats;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Load an image file as an RGBA frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<VideoFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !file_formats::is_image_extension(&extension) {
        return Err(BackendError::FormatNotSupported(format!(
            "Unsupported file format: {}",
            extension
        )));
    }

    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        BackendError::IoError(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();
    let data: Vec<u8> = rgba.into_raw();

    info!(width, height, "Image loaded successfully");

    Ok(VideoFrame {
        data: Arc::from(data.into_boxed_slice()),
        width,
        height,
        stride: width * 4,
        format: PixelFormat::Rgba,
        captured_at: Instant::now(),
    })
}

/// Load every image in `paths`, expanding directories one level deep
///
/// Unreadable entries are skipped with a warning; an empty result is an error.
pub fn load_frames(paths: &[PathBuf]) -> BackendResult<Vec<VideoFrame>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let entries = std::fs::read_dir(path).map_err(|e| {
                BackendError::IoError(format!("Cannot read '{}': {}", path.display(), e))
            })?;
            let mut dir_files: Vec<PathBuf> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|p| p.is_file())
                .collect();
            // Deterministic playback order
            dir_files.sort();
            files.extend(dir_files);
        } else {
            files.push(path.clone());
        }
    }

    let mut frames = Vec::with_capacity(files.len());
    for file in &files {
        match load_image_as_frame(file) {
            Ok(frame) => frames.push(frame),
            Err(e) => warn!(path = %file.display(), error = %e, "Skipping file"),
        }
    }

    if frames.is_empty() {
        return Err(BackendError::Other("No readable images".to_string()));
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unknown_extension() {
        let result = load_image_as_frame(Path::new("notes.txt"));
        assert!(matches!(result, Err(BackendError::FormatNotSupported(_))));
    }

    #[test]
    fn test_loads_png_round_trip() {
        let dir = std::env::temp_dir().join(format!("barcode-scanner-fs-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("frame.png");
        image::GrayImage::from_pixel(8, 4, image::Luma([200])).save(&path).unwrap();

        let frame = load_image_as_frame(&path).unwrap();
        assert_eq!((frame.width, frame.height), (8, 4));
        assert_eq!(frame.stride, 32);
        assert_eq!(frame.data.len(), 8 * 4 * 4);
        assert_eq!(&frame.data[0..4], &[200, 200, 200, 255]);

        let frames = load_frames(&[dir.clone()]).unwrap();
        assert_eq!(frames.len(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_frames_empty_is_error() {
        assert!(load_frames(&[PathBuf::from("missing.png")]).is_err());
    }
}
