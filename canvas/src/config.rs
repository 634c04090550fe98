//! Engine configuration.
//!
//! Hosts build a [`CanvasConfig`] from defaults, optionally overlay a JSON
//! document (every field is optional thanks to `#[serde(default)]`), and hand
//! it to [`crate::engine::EngineCore::with_config`].

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    A3_LONG_EDGE_MM, A3_SHORT_EDGE_MM, DEFAULT_ARROW_STEP_LARGE_PX, DEFAULT_ARROW_STEP_PX,
    DEFAULT_BACKGROUND_RENDER_SCALE, DEFAULT_DRAG_THRESHOLD_PX, DEFAULT_EXPORT_MULTIPLIER, DEFAULT_FIT_PADDING_PX,
    DEFAULT_JPEG_QUALITY, DEFAULT_PAGE_HEIGHT, DEFAULT_PAGE_WIDTH, DEFAULT_WHEEL_ZOOM_BASE, DEFAULT_ZOOM_STEP,
};
use crate::error::{CanvasError, Result};
use crate::viewport::ZoomLimits;

/// All tunables of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Allowed viewport scale range.
    pub zoom: ZoomLimits,
    /// Additive step for the zoom buttons.
    pub zoom_step: f64,
    /// Base of the wheel zoom curve.
    pub wheel_zoom_base: f64,
    /// Device pixels a press may travel and still count as a click.
    pub drag_threshold_px: f64,
    /// Padding kept around the page when fitting it into the viewport.
    pub fit_padding_px: f64,
    /// Arrow-key pan step.
    pub arrow_step_px: f64,
    /// Arrow-key pan step with a modifier held.
    pub arrow_step_large_px: f64,
    /// Page width in world units.
    pub page_width: f64,
    /// Page height in world units.
    pub page_height: f64,
    /// Long edge of the physical page in millimetres.
    pub page_long_edge_mm: f64,
    /// Short edge of the physical page in millimetres.
    pub page_short_edge_mm: f64,
    /// Default export resolution multiplier.
    pub export_multiplier: f64,
    /// JPEG quality in `0.0..=1.0`.
    pub jpeg_quality: f64,
    /// Scale requested from the rasterizer for uploaded documents.
    pub background_render_scale: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            zoom: ZoomLimits::default(),
            zoom_step: DEFAULT_ZOOM_STEP,
            wheel_zoom_base: DEFAULT_WHEEL_ZOOM_BASE,
            drag_threshold_px: DEFAULT_DRAG_THRESHOLD_PX,
            fit_padding_px: DEFAULT_FIT_PADDING_PX,
            arrow_step_px: DEFAULT_ARROW_STEP_PX,
            arrow_step_large_px: DEFAULT_ARROW_STEP_LARGE_PX,
            page_width: DEFAULT_PAGE_WIDTH,
            page_height: DEFAULT_PAGE_HEIGHT,
            page_long_edge_mm: A3_LONG_EDGE_MM,
            page_short_edge_mm: A3_SHORT_EDGE_MM,
            export_multiplier: DEFAULT_EXPORT_MULTIPLIER,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            background_render_scale: DEFAULT_BACKGROUND_RENDER_SCALE,
        }
    }
}

impl CanvasConfig {
    /// Parse a (possibly partial) JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidConfig`] if the JSON is malformed or the
    /// resulting values fail [`CanvasConfig::validate`].
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|e| CanvasError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for contradictions.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.zoom.validate()?;
        let positive = [
            ("zoom_step", self.zoom_step),
            ("wheel_zoom_base", self.wheel_zoom_base),
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("page_long_edge_mm", self.page_long_edge_mm),
            ("page_short_edge_mm", self.page_short_edge_mm),
            ("export_multiplier", self.export_multiplier),
            ("background_render_scale", self.background_render_scale),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(CanvasError::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }
        let non_negative = [
            ("drag_threshold_px", self.drag_threshold_px),
            ("fit_padding_px", self.fit_padding_px),
            ("arrow_step_px", self.arrow_step_px),
            ("arrow_step_large_px", self.arrow_step_large_px),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(CanvasError::InvalidConfig(format!("{name} must not be negative, got {value}")));
            }
        }
        if !(0.0..=1.0).contains(&self.jpeg_quality) {
            return Err(CanvasError::InvalidConfig(format!(
                "jpeg_quality must be within 0..=1, got {}",
                self.jpeg_quality
            )));
        }
        if self.page_short_edge_mm > self.page_long_edge_mm {
            return Err(CanvasError::InvalidConfig("page_short_edge_mm exceeds page_long_edge_mm".into()));
        }
        Ok(())
    }
}
