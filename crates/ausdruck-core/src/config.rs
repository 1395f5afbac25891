// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export pipeline configuration.
//
// The settle delays are fixed, empirically tuned values carried over from the
// portal screens. They approximate "layout has settled"; they are not a
// completion signal.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};
use crate::types::CaptureSettings;

/// Name of the JSON file the config is persisted to.
pub const CONFIG_FILE: &str = "ausdruck.json";

/// Persistent export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Upper bound on waiting for one pending image to load.
    pub image_load_timeout_ms: u64,
    /// Delay after all images reached a terminal state.
    pub preload_settle_ms: u64,
    /// Upper bound on one cross-origin re-fetch.
    pub fetch_timeout_ms: u64,
    /// Delay after the inlining pass, before capture.
    pub inline_settle_ms: u64,
    /// Upper bound on rasterizing the document.
    pub capture_timeout_ms: u64,
    /// Delay between the print surface's ready signal and printing.
    pub print_ready_settle_ms: u64,
    /// Print anyway if the ready signal has not fired by then.
    pub print_fallback_ms: u64,
    /// How long the temporary object reference outlives the print call.
    pub object_ref_grace_ms: u64,
    /// Close the print surface when the object reference is released.
    pub close_surface_after_print: bool,
    /// Base URL relative image paths are resolved against.
    pub asset_base_url: Option<String>,
    /// Where downloaded artifacts are written.
    pub download_dir: Option<PathBuf>,
    /// Rasterization settings.
    pub capture: CaptureSettings,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            image_load_timeout_ms: 15_000,
            preload_settle_ms: 800,
            fetch_timeout_ms: 15_000,
            inline_settle_ms: 300,
            capture_timeout_ms: 60_000,
            print_ready_settle_ms: 500,
            print_fallback_ms: 1_000,
            object_ref_grace_ms: 1_000,
            close_surface_after_print: false,
            asset_base_url: None,
            download_dir: None,
            capture: CaptureSettings::default(),
        }
    }
}

impl ExportConfig {
    pub fn image_load_timeout(&self) -> Duration {
        Duration::from_millis(self.image_load_timeout_ms)
    }

    pub fn preload_settle(&self) -> Duration {
        Duration::from_millis(self.preload_settle_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn inline_settle(&self) -> Duration {
        Duration::from_millis(self.inline_settle_ms)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    pub fn print_ready_settle(&self) -> Duration {
        Duration::from_millis(self.print_ready_settle_ms)
    }

    pub fn print_fallback(&self) -> Duration {
        Duration::from_millis(self.print_fallback_ms)
    }

    pub fn object_ref_grace(&self) -> Duration {
        Duration::from_millis(self.object_ref_grace_ms)
    }

    /// Reject values that would let a job hang or produce garbage.
    pub fn validate(&self) -> Result<()> {
        if self.image_load_timeout_ms == 0 {
            return Err(ExportError::Config(
                "image_load_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ExportError::Config(
                "fetch_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.capture_timeout_ms == 0 {
            return Err(ExportError::Config(
                "capture_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.print_fallback_ms == 0 {
            return Err(ExportError::Config(
                "print_fallback_ms must be greater than zero".into(),
            ));
        }
        let quality = self.capture.image_quality;
        if !(quality > 0.0 && quality <= 1.0) {
            return Err(ExportError::Config(format!(
                "capture.image_quality must be in (0, 1], got {quality}"
            )));
        }
        if self.capture.scale <= 0.0 {
            return Err(ExportError::Config(format!(
                "capture.scale must be positive, got {}",
                self.capture.scale
            )));
        }
        Ok(())
    }

    /// Load `ausdruck.json` from `dir`, or defaults if it does not exist.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Persist the config as pretty-printed JSON into `dir`.
    pub fn persist(&self, dir: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.join(CONFIG_FILE), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        ExportConfig::default().validate().expect("defaults valid");
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = ExportConfig {
            image_load_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ExportError::Config(_))));
    }

    #[test]
    fn quality_out_of_range_rejected() {
        let mut config = ExportConfig::default();
        config.capture.image_quality = 1.5;
        assert!(config.validate().is_err());
        config.capture.image_quality = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ExportConfig =
            serde_json::from_str(r#"{ "preload_settle_ms": 1200 }"#).expect("parse");
        assert_eq!(config.preload_settle(), Duration::from_millis(1200));
        assert_eq!(config.inline_settle(), Duration::from_millis(300));
        assert_eq!(config.capture.jpeg_quality(), 98);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = std::env::temp_dir().join(format!("ausdruck-config-{}", uuid::Uuid::new_v4()));
        let config = ExportConfig::load_from_dir(&dir).expect("defaults");
        assert_eq!(config.print_fallback_ms, 1_000);
    }
}
