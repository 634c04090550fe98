//! Viewport controller: the single owner of the live pan/zoom transform.
//!
//! Every mutation keeps `limits.min <= scale <= limits.max`. Out-of-range
//! requests are normalized to the nearest bound rather than rejected. Each
//! effective change raises a render request that the engine forwards to the
//! scene with [`ViewportController::take_render_request`].
//!
//! Panning and zooming need a measured surface; until the host reports one
//! through [`ViewportController::set_surface`] those calls are no-ops.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

use crate::camera::{Point, ViewportTransform};
use crate::consts::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM};
use crate::error::{CanvasError, Result};

/// Inclusive scale bounds for the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min: DEFAULT_MIN_ZOOM, max: DEFAULT_MAX_ZOOM }
    }
}

impl ZoomLimits {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp `scale` into the bounds. `NaN` maps to the lower bound.
    #[must_use]
    pub fn clamp(&self, scale: f64) -> f64 {
        if scale.is_nan() {
            return self.min;
        }
        scale.clamp(self.min, self.max)
    }

    /// Reject bounds that are non-positive, non-finite or inverted.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidConfig`] describing the problem.
    pub fn validate(&self) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min <= 0.0 {
            return Err(CanvasError::InvalidConfig(format!(
                "zoom bounds must be finite and positive, got [{}, {}]",
                self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(CanvasError::InvalidConfig(format!(
                "zoom minimum {} exceeds maximum {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Measured size of the host rendering surface, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
    /// Device pixel ratio of the backing store.
    pub dpr: f64,
}

impl SurfaceSize {
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }
}

/// Owns the viewport transform and enforces the zoom invariant.
#[derive(Debug, Clone)]
pub struct ViewportController {
    transform: ViewportTransform,
    limits: ZoomLimits,
    surface: Option<SurfaceSize>,
    render_requested: bool,
}

impl ViewportController {
    /// Create a controller at the identity transform (scale clamped into `limits`).
    #[must_use]
    pub fn new(limits: ZoomLimits) -> Self {
        let transform = ViewportTransform { scale: limits.clamp(1.0), ..ViewportTransform::default() };
        Self { transform, limits, surface: None, render_requested: false }
    }

    #[must_use]
    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    #[must_use]
    pub fn limits(&self) -> ZoomLimits {
        self.limits
    }

    #[must_use]
    pub fn surface(&self) -> Option<SurfaceSize> {
        self.surface
    }

    /// Record the authoritative surface size reported after layout.
    ///
    /// Sizes that are not strictly positive and finite are ignored and leave
    /// the previous surface in place. Returns whether the size was accepted.
    pub fn set_surface(&mut self, width: f64, height: f64, dpr: f64) -> bool {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return false;
        }
        let dpr = if valid(dpr) { dpr } else { 1.0 };
        self.surface = Some(SurfaceSize { width, height, dpr });
        self.render_requested = true;
        true
    }

    /// Translate by a device-pixel delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if self.surface.is_none() || !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.transform.translate_x += dx;
        self.transform.translate_y += dy;
        self.render_requested = true;
    }

    /// Zoom to `target_scale` keeping the world point under `device` fixed.
    pub fn zoom_at(&mut self, device: Point, target_scale: f64) {
        if self.surface.is_none() || target_scale.is_nan() || !device.x.is_finite() || !device.y.is_finite() {
            return;
        }
        let anchor_world = self.transform.to_world(device);
        let scale = self.limits.clamp(target_scale);
        self.transform = ViewportTransform {
            scale,
            translate_x: device.x - anchor_world.x * scale,
            translate_y: device.y - anchor_world.y * scale,
        };
        self.render_requested = true;
    }

    /// Additive zoom about the centre of the surface.
    pub fn zoom_by(&mut self, delta: f64) {
        let Some(surface) = self.surface else {
            return;
        };
        self.zoom_at(surface.center(), self.transform.scale + delta);
    }

    /// Assign the transform directly; only the scale is clamped.
    pub fn set_transform(&mut self, transform: ViewportTransform) {
        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        self.transform = ViewportTransform {
            scale: self.limits.clamp(transform.scale),
            translate_x: finite_or(transform.translate_x, self.transform.translate_x),
            translate_y: finite_or(transform.translate_y, self.transform.translate_y),
        };
        self.render_requested = true;
    }

    /// Consume the pending render request, if any.
    pub fn take_render_request(&mut self) -> bool {
        std::mem::take(&mut self.render_requested)
    }
}
