//! Shared numeric constants for the canvas crate.
//!
//! Anything a host may want to tune lives in [`crate::config::CanvasConfig`];
//! the values here are its defaults plus a few fixed protocol numbers.

// ── Viewport ────────────────────────────────────────────────────

/// Default lower zoom bound.
pub const DEFAULT_MIN_ZOOM: f64 = 0.1;

/// Default upper zoom bound.
pub const DEFAULT_MAX_ZOOM: f64 = 8.0;

/// Default padding, in device pixels, kept around the page when fitting.
pub const DEFAULT_FIT_PADDING_PX: f64 = 20.0;

/// Additive zoom step used by the zoom-in / zoom-out buttons.
pub const DEFAULT_ZOOM_STEP: f64 = 0.1;

/// Base of the exponential wheel zoom curve: `scale * base^deltaY`.
pub const DEFAULT_WHEEL_ZOOM_BASE: f64 = 0.999;

// ── Gestures ────────────────────────────────────────────────────

/// Pointer travel, in device pixels, beyond which a press becomes a drag.
pub const DEFAULT_DRAG_THRESHOLD_PX: f64 = 5.0;

/// Arrow-key pan step in device pixels.
pub const DEFAULT_ARROW_STEP_PX: f64 = 20.0;

/// Arrow-key pan step while a modifier is held.
pub const DEFAULT_ARROW_STEP_LARGE_PX: f64 = 100.0;

/// Angle applied by a click-to-rotate gesture, in degrees.
pub const ROTATE_STEP_DEG: f64 = 90.0;

// ── Page ────────────────────────────────────────────────────────

/// Page width in world units (A3 landscape at 150 dpi).
pub const DEFAULT_PAGE_WIDTH: f64 = 2480.0;

/// Page height in world units (A3 landscape at 150 dpi).
pub const DEFAULT_PAGE_HEIGHT: f64 = 1754.0;

/// Long edge of an A3 sheet in millimetres.
pub const A3_LONG_EDGE_MM: f64 = 420.0;

/// Short edge of an A3 sheet in millimetres.
pub const A3_SHORT_EDGE_MM: f64 = 297.0;

/// PDF points per millimetre.
pub const PT_PER_MM: f64 = 72.0 / 25.4;

// ── Export / upload ─────────────────────────────────────────────

/// Default export resolution multiplier.
pub const DEFAULT_EXPORT_MULTIPLIER: f64 = 2.0;

/// Largest edge, in pixels, an export raster may have.
pub const MAX_EXPORT_EDGE_PX: u32 = 16_384;

/// Default JPEG quality in `0.0..=1.0`.
pub const DEFAULT_JPEG_QUALITY: f64 = 0.92;

/// Scale handed to the rasterizer when an uploaded document is rendered.
pub const DEFAULT_BACKGROUND_RENDER_SCALE: f64 = 2.0;

// ── Snapshots ───────────────────────────────────────────────────

/// The only snapshot format version this build accepts.
pub const SNAPSHOT_VERSION: i64 = 1;
