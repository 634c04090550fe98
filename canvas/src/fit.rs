//! Fit calculator: the transform that centres a world rectangle in the viewport.
//!
//! Only meaningful once the host surface has reported its real size; the
//! engine calls this from `surface_ready`, never against a guessed size.

#[cfg(test)]
#[path = "fit_test.rs"]
mod fit_test;

use crate::camera::{Rect, ViewportTransform};
use crate::viewport::ZoomLimits;

/// Compute the transform that scales `region` to fit inside a
/// `viewport_width` x `viewport_height` surface with `padding` on every side,
/// and centres it.
///
/// The scale is clamped into `limits`; a clamped scale still centres the
/// region (it may then overflow or underfill the padded box).
#[must_use]
pub fn fit_region(
    region: Rect,
    viewport_width: f64,
    viewport_height: f64,
    padding: f64,
    limits: ZoomLimits,
) -> ViewportTransform {
    let avail_w = (viewport_width - 2.0 * padding).max(0.0);
    let avail_h = (viewport_height - 2.0 * padding).max(0.0);

    let ratio = |avail: f64, extent: f64| if extent > 0.0 { avail / extent } else { f64::INFINITY };
    let scale = limits.clamp(ratio(avail_w, region.width).min(ratio(avail_h, region.height)));

    ViewportTransform {
        scale,
        translate_x: padding + (avail_w - region.width * scale) / 2.0 - region.x * scale,
        translate_y: padding + (avail_h - region.height * scale) / 2.0 - region.y * scale,
    }
}
