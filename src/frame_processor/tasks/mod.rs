// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks

pub mod qr_reader;

pub use qr_reader::QrReader;
