//! Pipeline configuration.
//!
//! Sizing and format settings for the offscreen render target, loadable from
//! JSON and clamped to usable ranges by [`PipelineConfig::validate`].

use serde::{Deserialize, Serialize};

use crate::error::BridgeResult;
use crate::format::{TextureFormat, REFERENCE_DPI};

/// Smallest logical width/height a render target is created with.
pub const DEFAULT_MIN_LOGICAL_SIZE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Logical sizes below this are raised to it before scaling by DPI.
    pub min_logical_size: f64,

    /// DPI that a scale factor of 1.0 stands for.
    pub reference_dpi: f32,

    /// Format of the offscreen render target. Must have a legacy equivalent.
    pub render_format: TextureFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_logical_size: DEFAULT_MIN_LOGICAL_SIZE,
            reference_dpi: REFERENCE_DPI,
            render_format: TextureFormat::B8G8R8A8Unorm,
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json(json: &str) -> BridgeResult<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.validate();
        Ok(config)
    }

    /// Clamp settings to acceptable ranges.
    pub fn validate(&mut self) {
        if !self.min_logical_size.is_finite() || self.min_logical_size < 1.0 {
            self.min_logical_size = 1.0;
        }
        if !self.reference_dpi.is_finite() || self.reference_dpi <= 0.0 {
            self.reference_dpi = REFERENCE_DPI;
        }
        if self.render_format.to_legacy().is_none() {
            log::warn!(
                "Render format {:?} cannot be shared, using B8G8R8A8",
                self.render_format
            );
            self.render_format = TextureFormat::B8G8R8A8Unorm;
        }
    }

    /// Reset all settings to defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
