// SPDX-License-Identifier: GPL-3.0-only

//! Scanner configuration
//!
//! Configuration is captured once when a controller is built and never
//! changes for the lifetime of a session. Every field has a default, so a
//! JSON file only needs to list what it overrides.

use crate::backends::camera::types::VideoConstraints;
use crate::constants::{DEFAULT_DEBOUNCE_MS, DEFAULT_FORMATS};
use crate::errors::{ScannerError, ScannerResult};
use crate::frame_processor::BarcodeFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Directory name under the user config dir
const CONFIG_DIR_NAME: &str = "barcode-scanner";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Keep scanning after the first accepted hit
    pub continuous: bool,
    /// Identical payloads inside this window are dropped
    pub debounce_ms: u64,
    /// Symbologies requested from a native detector, in preference order
    pub preferred_formats: Vec<BarcodeFormat>,
    /// Capture constraints for the camera stream
    pub video: VideoConstraints,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            continuous: true,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            preferred_formats: DEFAULT_FORMATS.to_vec(),
            video: VideoConstraints::default(),
        }
    }
}

impl ScannerConfig {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Check invariants serde cannot express
    pub fn validate(&self) -> ScannerResult<()> {
        if self.preferred_formats.is_empty() {
            return Err(ScannerError::Config(
                "preferred_formats must list at least one symbology".to_string(),
            ));
        }
        if let (Some(min), Some(max)) = (self.video.width.min, self.video.width.max)
            && min > max
        {
            return Err(ScannerError::Config(format!(
                "video.width.min ({}) exceeds video.width.max ({})",
                min, max
            )));
        }
        if let (Some(min), Some(max)) = (self.video.height.min, self.video.height.max)
            && min > max
        {
            return Err(ScannerError::Config(format!(
                "video.height.min ({}) exceeds video.height.max ({})",
                min, max
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> ScannerResult<Self> {
        let config: ScannerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> ScannerResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            ScannerError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        let config = Self::from_json(&json)?;
        info!(path = %path.display(), "Loaded scanner configuration");
        Ok(config)
    }

    /// Load from `path`, or from the default location when `None`
    ///
    /// A missing default file yields the defaults; a missing explicit file
    /// or an invalid file is an error.
    pub fn load_or_default(path: Option<&Path>) -> ScannerResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn to_json_pretty(&self) -> ScannerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// `<config dir>/barcode-scanner/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
