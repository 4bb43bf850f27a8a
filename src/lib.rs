// SPDX-License-Identifier: GPL-3.0-only

//! Barcode Scanner - camera barcode and QR code scanning
//!
//! This library drives a camera stream, decodes barcodes from the frames it
//! paints and reports each distinct payload once per debounce window.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`scanner`]: Scanner controller, decode strategies and debouncing
//! - [`backends`]: Camera platform abstraction and the still-image virtual camera
//! - [`frame_processor`]: Barcode types and the software QR reader
//! - [`config`]: Scanner configuration
//! - [`errors`]: Error types
//!
//! # Example
//!
//! ```ignore
//! let platform = Arc::new(VirtualCamera::from_files(&paths)?);
//! let sink = Arc::new(PreviewSink::new());
//! let scanner = ScannerController::builder(platform, sink)
//!     .on_scan(|scan| println!("{}", scan.text))
//!     .build();
//! scanner.start().await?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod frame_processor;
pub mod scanner;

// Re-export commonly used types
pub use backends::camera::{CameraPlatform, PreviewSink, VideoSink};
pub use backends::virtual_camera::VirtualCamera;
pub use config::ScannerConfig;
pub use errors::{ScannerError, ScannerResult};
pub use frame_processor::{BarcodeFormat, DecodedBarcode, ScanResult};
pub use scanner::{ScannerController, ScannerPhase, ScannerStatus, StrategyKind};
