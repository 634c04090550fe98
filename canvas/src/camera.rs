//! Coordinate mapping between device space and world space.
//!
//! Device space is the pixel grid pointer events arrive in. World space is the
//! fixed plane the page and every object live on. [`ViewportTransform`] is the
//! uniform scale plus translation that maps one onto the other; it never
//! carries rotation or shear.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

/// A point in either device or world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// An axis-aligned rectangle in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// `true` when the rectangle is at least as wide as it is tall.
    #[must_use]
    pub fn is_landscape(&self) -> bool {
        self.width >= self.height
    }
}

/// Scale + translation mapping world space onto device space.
///
/// `device = world * scale + translate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self { scale: 1.0, translate_x: 0.0, translate_y: 0.0 }
    }
}

impl ViewportTransform {
    #[must_use]
    pub fn new(scale: f64, translate_x: f64, translate_y: f64) -> Self {
        Self { scale, translate_x, translate_y }
    }

    /// Convert a device-space point to world coordinates.
    #[must_use]
    pub fn to_world(&self, device: Point) -> Point {
        to_world(device, self)
    }

    /// Convert a world-space point to device coordinates.
    #[must_use]
    pub fn to_device(&self, world: Point) -> Point {
        to_device(world, self)
    }

    /// Convert a device-space distance to a world-space distance.
    #[must_use]
    pub fn device_dist_to_world(&self, device_dist: f64) -> f64 {
        device_dist / self.scale
    }
}

/// `world = (device - translate) / scale`.
///
/// `transform.scale` is never below the controller's minimum zoom, so the
/// division is always well defined.
#[must_use]
pub fn to_world(device: Point, transform: &ViewportTransform) -> Point {
    Point {
        x: (device.x - transform.translate_x) / transform.scale,
        y: (device.y - transform.translate_y) / transform.scale,
    }
}

/// `device = world * scale + translate`.
#[must_use]
pub fn to_device(world: Point, transform: &ViewportTransform) -> Point {
    Point {
        x: world.x * transform.scale + transform.translate_x,
        y: world.y * transform.scale + transform.translate_y,
    }
}
