// SPDX-License-Identifier: GPL-3.0-only

//! Barcode scanning
//!
//! [`ScannerController`] drives one camera session: it acquires the stream,
//! picks a decode strategy, runs a paint-tick frame loop and publishes
//! debounced results through a callback.

mod controller;
mod debounce;
mod history;
mod session;
pub mod strategy;

pub use controller::{ScanCallback, ScannerBuilder, ScannerController, SystemTimeSource, TimeSource};
pub use debounce::Debouncer;
pub use history::{HistoryEntry, ScanHistory};
pub use session::{ScannerPhase, ScannerStatus};
pub use strategy::{DecodeStrategy, FrameOutcome, StrategyKind};
