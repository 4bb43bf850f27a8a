// SPDX-License-Identifier: GPL-3.0-only

//! Frame processor module
//!
//! Result types shared by every decode path, and the software reader task
//! used when the platform has no native barcode detector.

pub mod tasks;
pub mod types;

pub use tasks::qr_reader;
pub use types::{BarcodeFormat, DecodedBarcode, FrameRegion, ScanResult};
